//! Testing utilities for the cutout workspace
//!
//! Shared fixtures, a scripted transformer and a mock HTTP service.

#![allow(missing_docs)]

use async_trait::async_trait;
use cutout_asset::{Asset, Costume, CostumeList, DataFormat, ImageBytes, Target};
use cutout_host::SkinRenderer;
use cutout_transform::{TransformError, TransformOutput, TransformRequest, TransformResult, Transformer};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Image fixtures
// ---------------------------------------------------------------------------

fn encode(image: DynamicImage, format: ImageFormat) -> ImageBytes {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    ImageBytes::from(buf)
}

/// Encoded PNG with a transparent left half
pub fn png_bytes(width: u32, height: u32) -> ImageBytes {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([200, 80, 40, 255])
        }
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Encoded JPEG (no alpha channel)
pub fn jpeg_bytes(width: u32, height: u32) -> ImageBytes {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 220]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// Minimal SVG document
pub fn svg_bytes() -> ImageBytes {
    ImageBytes::from(&br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"></svg>"#[..])
}

/// Successful transform output carrying a PNG
pub fn png_output(width: u32, height: u32) -> TransformOutput {
    TransformOutput {
        bytes: png_bytes(width, height),
        format: DataFormat::Png,
        content_type: "image/png".to_string(),
    }
}

/// Costume whose asset bytes are resident
pub fn resident_costume(name: &str, format: DataFormat, bytes: ImageBytes) -> Costume {
    Costume::new(name, Asset::from_bytes(format, bytes))
}

/// Target with a variant list, registered with `renderer`
pub fn listed_target(renderer: &SkinRenderer, costume: Costume) -> Target {
    let drawable = renderer.add_drawable(costume.skin());
    Target::new("Sprite1", drawable, CostumeList::new(costume))
}

/// Legacy target without a variant list, registered with `renderer`
pub fn legacy_target(renderer: &SkinRenderer, costume: Costume) -> Target {
    let drawable = renderer.add_drawable(costume.skin());
    Target::legacy("Sprite1", drawable, costume)
}

// ---------------------------------------------------------------------------
// Scripted transformer
// ---------------------------------------------------------------------------

/// [`Transformer`] that replays queued results in order
///
/// Once the script runs out every call fails with a network error.
#[derive(Default)]
pub struct ScriptedTransformer {
    script: Mutex<VecDeque<TransformResult<TransformOutput>>>,
    requests: Mutex<Vec<TransformRequest>>,
    delay: Option<Duration>,
}

impl ScriptedTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a success
    pub fn then_ok(self, output: TransformOutput) -> Self {
        self.script.lock().push_back(Ok(output));
        self
    }

    /// Queue a failure
    pub fn then_err(self, error: TransformError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Wait before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<TransformRequest> {
        self.requests.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transformer for ScriptedTransformer {
    async fn transform(&self, request: TransformRequest) -> TransformResult<TransformOutput> {
        self.requests.lock().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| Err(TransformError::NetworkError("script exhausted".to_string())))
    }
}

// ---------------------------------------------------------------------------
// Mock HTTP service
// ---------------------------------------------------------------------------

/// What the mock service answers with
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
}

impl MockResponse {
    /// 200 with an image body
    pub fn image(content_type: &str, body: ImageBytes) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.to_vec(),
            delay: None,
        }
    }

    /// Arbitrary status with a text body
    pub fn text(status: u16, content_type: &str, body: &str) -> Self {
        Self {
            status,
            content_type: Some(content_type.to_string()),
            body: body.as_bytes().to_vec(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Request as seen by the mock service
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lower-cased
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// First value of header `name`
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP server on an ephemeral local port answering every request alike
pub struct MockService {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockService {
    /// Start serving `response`; the server stops when dropped
    pub async fn start(response: MockResponse) -> Self {
        use warp::Filter;

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let route = warp::any()
            .and(warp::method())
            .and(warp::path::full())
            .and(warp::header::headers_cloned())
            .and(warp::body::bytes())
            .and_then(move |method: warp::http::Method, path: warp::path::FullPath, headers: warp::http::HeaderMap, body: warp::hyper::body::Bytes| {
                let recorded = Arc::clone(&recorded);
                let response = response.clone();
                async move {
                    recorded.lock().push(RecordedRequest {
                        method: method.to_string(),
                        path: path.as_str().to_string(),
                        headers: headers
                            .iter()
                            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
                            .collect(),
                        body: body.to_vec(),
                    });
                    if let Some(delay) = response.delay {
                        tokio::time::sleep(delay).await;
                    }
                    let mut builder = warp::http::Response::builder().status(response.status);
                    if let Some(content_type) = &response.content_type {
                        builder = builder.header("content-type", content_type.as_str());
                    }
                    Ok::<_, Infallible>(builder.body(response.body).unwrap())
                }
            });

        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        let handle = tokio::spawn(server);
        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Endpoint URL under the mock server
    pub fn url(&self) -> String {
        format!("http://{}/v2", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
