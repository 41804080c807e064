//! Relay Proxy Tests
//!
//! Drives the warp filter in-process with `warp::test`, relaying either to a
//! scripted transformer or through the HTTP client to a mock service.
//!
use cutout_asset::{DataFormat, ImageBytes};
use cutout_cli::config::DEFAULT_ALLOWED_ORIGINS;
use cutout_cli::proxy::{routes, ProxyState};
use cutout_test_utils::{jpeg_bytes, png_bytes, png_output, MockResponse, MockService, ScriptedTransformer};
use cutout_transform::{ApiKey, HttpTransformClient, TransformConfig, Transformer, FIELD_NAME};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use warp::http::StatusCode;

fn origins() -> Vec<String> {
    DEFAULT_ALLOWED_ORIGINS.iter().map(ToString::to_string).collect()
}

fn state(transformer: Arc<dyn Transformer>, save_dir: &Path) -> Arc<ProxyState> {
    Arc::new(ProxyState::new(transformer, save_dir))
}

const BOUNDARY: &str = "cutout-test-boundary";

/// `(content type header, body)` of a form with one `image_file` part
fn image_form(bytes: ImageBytes, filename: &str, format: &DataFormat) -> (String, Vec<u8>) {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{FIELD_NAME}\"; filename=\"{filename}\"\r\n\
         Content-Type: {}\r\n\r\n",
        format.mime()
    )
    .into_bytes();
    body.extend_from_slice(bytes.as_slice());
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

fn erase_request(content_type: &str, body: Vec<u8>) -> warp::test::RequestBuilder {
    warp::test::request()
        .method("POST")
        .path("/erase")
        .header("content-type", content_type)
        .body(body)
}

fn saved_files(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_ping() {
    let dir = tempfile::tempdir().unwrap();
    let filter = routes(state(Arc::new(ScriptedTransformer::new()), dir.path()), &origins()).unwrap();

    let res = warp::test::request().method("GET").path("/ping").reply(&filter).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body, serde_json::json!({ "ok": true }));
}

#[tokio::test]
async fn test_erase_relays_and_saves_copy() {
    let dir = tempfile::tempdir().unwrap();
    let save_dir = dir.path().join("saved");
    let transformer = Arc::new(ScriptedTransformer::new().then_ok(png_output(6, 6)));
    let filter = routes(state(transformer.clone(), &save_dir), &origins()).unwrap();

    let (content_type, body) = image_form(jpeg_bytes(6, 6), "my cat.jpg", &DataFormat::Jpeg);
    let res = erase_request(&content_type, body).reply(&filter).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.body().to_vec(), png_bytes(6, 6).to_vec());

    let sent = &transformer.requests()[0];
    assert_eq!(sent.filename, "my cat.jpg");
    assert_eq!(sent.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(sent.bytes, jpeg_bytes(6, 6));

    let files = saved_files(&save_dir);
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("_my_cat.png"), "{files:?}");
    assert_eq!(std::fs::read(save_dir.join(&files[0])).unwrap(), png_bytes(6, 6).to_vec());
}

#[tokio::test]
async fn test_erase_without_image_part_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let transformer = Arc::new(ScriptedTransformer::new());
    let filter = routes(state(transformer.clone(), dir.path()), &origins()).unwrap();

    let body = "--XYZ\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nhello\r\n--XYZ--\r\n";
    let res = erase_request("multipart/form-data; boundary=XYZ", body.as_bytes().to_vec())
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body().as_ref(), b"image_file required");
    assert_eq!(transformer.calls(), 0);
}

#[tokio::test]
async fn test_upstream_error_status_and_body_pass_through() {
    let dir = tempfile::tempdir().unwrap();
    let save_dir = dir.path().join("saved");
    let upstream = MockService::start(MockResponse::text(402, "application/json", r#"{"error":"quota"}"#)).await;
    let client = HttpTransformClient::new(TransformConfig::new(ApiKey::new("proxy-key")).with_endpoint(upstream.url()))
        .unwrap();
    let filter = routes(state(Arc::new(client), &save_dir), &origins()).unwrap();

    let (content_type, body) = image_form(png_bytes(4, 4), "cat.png", &DataFormat::Png);
    let res = erase_request(&content_type, body).reply(&filter).await;

    assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(res.body().as_ref(), br#"{"error":"quota"}"#);
    assert_eq!(upstream.requests()[0].header("x-api-key"), Some("proxy-key"));
    assert!(saved_files(&save_dir).is_empty());
}

#[tokio::test]
async fn test_relay_failure_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    // An empty script fails every call with a network error.
    let filter = routes(state(Arc::new(ScriptedTransformer::new()), dir.path()), &origins()).unwrap();

    let (content_type, body) = image_form(png_bytes(4, 4), "cat.png", &DataFormat::Png);
    let res = erase_request(&content_type, body).reply(&filter).await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8_lossy(res.body()).contains("network error"));
}

#[tokio::test]
async fn test_cors_allows_editor_origin_only() {
    let dir = tempfile::tempdir().unwrap();
    let filter = routes(state(Arc::new(ScriptedTransformer::new()), dir.path()), &origins()).unwrap();

    let allowed = warp::test::request()
        .method("GET")
        .path("/ping")
        .header("origin", "http://localhost:8601")
        .reply(&filter)
        .await;
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(allowed.headers()["access-control-allow-origin"], "http://localhost:8601");

    let denied = warp::test::request()
        .method("GET")
        .path("/ping")
        .header("origin", "http://elsewhere.example")
        .reply(&filter)
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}

#[test]
fn test_malformed_origin_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let result = routes(
        state(Arc::new(ScriptedTransformer::new()), dir.path()),
        &["localhost:8601".to_string()],
    );
    assert!(result.is_err());
}
