//! Relay proxy
//!
//! Browsers cannot hold the service key, so the editor posts to this proxy
//! instead. `POST /erase` takes a multipart form with an `image_file` part,
//! forwards it through the transform client, keeps a copy of each result in
//! the save directory and answers with the PNG bytes. Upstream error statuses
//! and bodies are passed through unchanged.

use crate::config::ProxyConfig;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cutout_transform::{TransformError, TransformRequest, Transformer, FIELD_NAME};
use futures::TryStreamExt;
use regex::Regex;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use warp::http::{StatusCode, Uri};
use warp::hyper::body::Buf;
use warp::multipart::FormData;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Largest accepted form body
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Filename used when the part carries none
pub const DEFAULT_FILENAME: &str = "input.jpg";

/// Part content type used when the part carries none
pub const DEFAULT_PART_TYPE: &str = "application/octet-stream";

/// Shared state for the proxy handlers
pub struct ProxyState {
    transformer: Arc<dyn Transformer>,
    save_dir: PathBuf,
}

impl ProxyState {
    #[must_use]
    pub fn new(transformer: Arc<dyn Transformer>, save_dir: impl Into<PathBuf>) -> Self {
        Self {
            transformer,
            save_dir: save_dir.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }
}

impl std::fmt::Debug for ProxyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyState")
            .field("save_dir", &self.save_dir)
            .finish_non_exhaustive()
    }
}

/// Base name for a saved copy: extension stripped, runs of anything outside
/// ASCII `[0-9A-Za-z_]` replaced by `_`
///
/// Falls back to `image` when nothing is left.
#[must_use]
pub fn safe_base(filename: &str) -> String {
    static PATTERNS: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        let extension = Regex::new(r"\.[^.]+$").ok()?;
        let non_word = Regex::new(r"[^0-9A-Za-z_]+").ok()?;
        Some((extension, non_word))
    });

    let safe = match patterns {
        Some((extension, non_word)) => {
            let base = extension.replace(filename, "");
            non_word.replace_all(&base, "_").into_owned()
        }
        None => filename
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect(),
    };

    if safe.is_empty() {
        "image".to_string()
    } else {
        safe
    }
}

/// Name of the saved copy: `<unix millis>_<safe base>.png`
#[must_use]
pub fn saved_file_name(filename: &str) -> String {
    format!("{}_{}.png", Utc::now().timestamp_millis(), safe_base(filename))
}

fn validate_origin(origin: &str) -> Result<()> {
    let uri: Uri = origin
        .parse()
        .with_context(|| format!("invalid allowed origin {origin:?}"))?;
    let bare = uri.path_and_query().map_or(true, |p| p.as_str() == "/");
    if uri.scheme().is_none() || uri.authority().is_none() || !bare || origin.ends_with('/') {
        bail!("allowed origin must look like scheme://host[:port], got {origin:?}");
    }
    Ok(())
}

/// Build the proxy filter
///
/// # Errors
/// Returns error if an allowed origin is malformed
pub fn routes(
    state: Arc<ProxyState>,
    allowed_origins: &[String],
) -> Result<impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone> {
    for origin in allowed_origins {
        validate_origin(origin)?;
    }

    let cors = warp::cors()
        .allow_origins(allowed_origins.iter().map(String::as_str))
        .allow_methods(vec!["GET", "POST", "OPTIONS"]);

    let ping = warp::path("ping")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "ok": true })));

    let erase = warp::path("erase")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::any().map(move || state.clone()))
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
        .and_then(handle_erase);

    Ok(ping.or(erase).with(cors).with(warp::log::custom(log_request)))
}

fn log_request(info: warp::log::Info<'_>) {
    tracing::info!(
        method = %info.method(),
        path = info.path(),
        status = info.status().as_u16(),
        elapsed_ms = info.elapsed().as_millis(),
        "proxy request"
    );
}

struct UploadedPart {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn read_image_part(mut form: FormData) -> Result<Option<UploadedPart>, warp::Error> {
    while let Some(part) = form.try_next().await? {
        if part.name() != FIELD_NAME {
            continue;
        }
        let filename = part
            .filename()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();
        let content_type = part.content_type().unwrap_or(DEFAULT_PART_TYPE).to_string();
        let bytes = part
            .stream()
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(chunk.chunk());
                Ok(acc)
            })
            .await?;
        return Ok(Some(UploadedPart {
            filename,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

fn text_reply(status: StatusCode, body: impl Into<String>) -> Response {
    warp::reply::with_status(body.into(), status).into_response()
}

async fn handle_erase(state: Arc<ProxyState>, form: FormData) -> Result<Response, Infallible> {
    let upload = match read_image_part(form).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return Ok(text_reply(StatusCode::BAD_REQUEST, "image_file required")),
        Err(e) => return Ok(text_reply(StatusCode::BAD_REQUEST, format!("invalid form: {e}"))),
    };

    let request = TransformRequest::new(upload.bytes.into(), upload.filename.clone())
        .with_content_type(upload.content_type);
    let output = match state.transformer.transform(request).await {
        Ok(output) => output,
        Err(TransformError::HttpError { status, body }) => {
            tracing::warn!(status, "upstream rejected upload");
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            return Ok(text_reply(status, body.raw()));
        }
        Err(e @ TransformError::EncodeFailed(_)) => {
            return Ok(text_reply(StatusCode::BAD_REQUEST, e.to_string()));
        }
        Err(e) => {
            tracing::error!(error = %e, "relay failed");
            return Ok(text_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let path = state.save_dir.join(saved_file_name(&upload.filename));
    if let Err(e) = save_copy(&state.save_dir, &path, output.bytes.as_slice()).await {
        tracing::error!(error = %e, path = %path.display(), "could not save copy");
        return Ok(text_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
    }
    tracing::info!(path = %path.display(), "saved copy");

    Ok(warp::reply::with_header(output.bytes.to_vec(), "content-type", "image/png").into_response())
}

async fn save_copy(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, bytes).await
}

/// Bind and run until Ctrl-C
///
/// # Errors
/// Returns error if the origins are malformed or the address cannot be bound
pub async fn serve(state: Arc<ProxyState>, config: &ProxyConfig) -> Result<SocketAddr> {
    let filter = routes(state, &config.allowed_origins)?;
    let (addr, server) = warp::serve(filter)
        .try_bind_with_graceful_shutdown(config.bind, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
        })
        .with_context(|| format!("binding {}", config.bind))?;

    tracing::info!(%addr, "proxy on http://{addr}/erase");
    server.await;
    tracing::info!("proxy stopped");
    Ok(addr)
}
