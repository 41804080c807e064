//! Command Tests
//!
//! `remove` and `costume` against a mock service or a scripted transformer,
//! writing into temporary directories.
//!
use cutout_asset::DataFormat;
use cutout_cli::cli::{Action, GlobalArgs, Invocation};
use cutout_cli::commands::{run_costume, run_remove, CostumeRun};
use cutout_cli::LogFormat;
use cutout_core::{InstallMode, PipelineConfig};
use cutout_test_utils::{jpeg_bytes, png_bytes, png_output, svg_bytes, MockResponse, MockService, ScriptedTransformer};
use cutout_transform::{ApiKey, HttpTransformClient, TransformConfig};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn client_for(service: &MockService) -> HttpTransformClient {
    HttpTransformClient::new(TransformConfig::batch(ApiKey::new("test-key")).with_endpoint(service.url())).unwrap()
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn globals(config: Option<PathBuf>, api_key: Option<&str>) -> GlobalArgs {
    GlobalArgs {
        config,
        api_key: api_key.map(ToString::to_string),
        endpoint: None,
        log_format: LogFormat::Text,
    }
}

#[tokio::test]
async fn test_remove_writes_default_output_next_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let result = png_bytes(8, 8);
    let service = MockService::start(MockResponse::image("image/png", result.clone())).await;
    let src = write_file(dir.path(), "cat.jpg", jpeg_bytes(8, 8).as_slice());

    let written = run_remove(&client_for(&service), &src, None).await.unwrap();

    assert_eq!(written, dir.path().join("cat-cutout.png"));
    assert_eq!(std::fs::read(&written).unwrap(), result.to_vec());

    let body = service.requests()[0].body_text();
    assert!(body.contains(r#"filename="cat.jpg""#));
    assert!(body.contains("Content-Type: image/jpeg\r\n"));
}

#[tokio::test]
async fn test_remove_honours_explicit_destination() {
    let dir = tempfile::tempdir().unwrap();
    let service = MockService::start(MockResponse::image("image/jpeg", jpeg_bytes(4, 4))).await;
    let src = write_file(dir.path(), "dog.png", png_bytes(4, 4).as_slice());
    let dst = dir.path().join("out.bin");

    let written = run_remove(&client_for(&service), &src, Some(dst.as_path())).await.unwrap();

    assert_eq!(written, dst);
    assert!(dst.exists());
    assert!(!dir.path().join("dog-cutout.jpg").exists());
}

#[tokio::test]
async fn test_remove_missing_source_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let service = MockService::start(MockResponse::image("image/png", png_bytes(2, 2))).await;

    let err = run_remove(&client_for(&service), &dir.path().join("nope.png"), None)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("nope.png"));
    assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_remove_surfaces_service_error() {
    let dir = tempfile::tempdir().unwrap();
    let service = MockService::start(MockResponse::text(402, "application/json", r#"{"error":"out of credits"}"#)).await;
    let src = write_file(dir.path(), "cat.png", png_bytes(4, 4).as_slice());

    let err = run_remove(&client_for(&service), &src, None).await.unwrap_err();

    assert!(format!("{err:#}").contains("out of credits"));
    assert!(!dir.path().join("cat-cutout.png").exists());
}

#[tokio::test]
async fn test_costume_appends_variant_and_saves_asset() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("assets");
    let src = write_file(dir.path(), "cat.jpg", jpeg_bytes(8, 8).as_slice());
    let transformer = Arc::new(ScriptedTransformer::new().then_ok(png_output(8, 8)));

    let run = CostumeRun::new(&src).with_out(&out);
    let report = run_costume(transformer.clone(), &PipelineConfig::new(), &run).await.unwrap();

    assert_eq!(report.outcome.mode, InstallMode::Appended { index: 1 });
    assert_eq!(report.variants, 2);
    assert_eq!(report.outcome.costume.name(), "cat (bg)");
    assert_eq!(report.outcome.costume.format(), &DataFormat::Png);
    assert_eq!(
        report.saved,
        out.join(format!("{}.png", report.outcome.asset_id))
    );
    assert_eq!(std::fs::read(&report.saved).unwrap(), png_bytes(8, 8).to_vec());

    let sent = &transformer.requests()[0];
    assert_eq!(sent.format, Some(DataFormat::Jpeg));
    assert_eq!(sent.filename, "costume.jpg");
}

#[tokio::test]
async fn test_costume_legacy_target_is_rebound() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_file(dir.path(), "cat.png", png_bytes(4, 4).as_slice());
    let transformer = Arc::new(ScriptedTransformer::new().then_ok(png_output(4, 4)));

    let run = CostumeRun::new(&src).with_name("Tabby").legacy(true);
    let report = run_costume(transformer, &PipelineConfig::new(), &run).await.unwrap();

    assert_eq!(report.outcome.mode, InstallMode::Rebound);
    assert_eq!(report.variants, 1);
    assert_eq!(report.outcome.costume.name(), "Tabby (bg)");
    assert_eq!(report.saved.parent(), Some(dir.path()));
}

#[tokio::test]
async fn test_costume_vector_source_reports_user_message() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("assets");
    let src = write_file(dir.path(), "logo.svg", svg_bytes().as_slice());
    let transformer = Arc::new(ScriptedTransformer::new());

    let run = CostumeRun::new(&src).with_out(&out);
    let err = run_costume(transformer.clone(), &PipelineConfig::new(), &run).await.unwrap_err();

    assert!(err.to_string().starts_with("Background Remover: "));
    assert_eq!(transformer.calls(), 0);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_run_requires_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_file(dir.path(), "cat.png", png_bytes(2, 2).as_slice());

    let err = cutout_cli::run(Invocation {
        global: globals(None, None),
        action: Action::Remove { src, dst: None },
    })
    .await
    .unwrap_err();

    assert!(err.to_string().contains("no API key"));
}

#[tokio::test]
async fn test_run_reads_endpoint_and_key_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let service = MockService::start(MockResponse::image("image/png", png_bytes(4, 4))).await;
    let config = write_file(
        dir.path(),
        "cutout.toml",
        format!("[transform]\nendpoint = \"{}\"\napi_key = \"file-key\"\n", service.url()).as_bytes(),
    );
    let src = write_file(dir.path(), "cat.png", png_bytes(4, 4).as_slice());

    cutout_cli::run(Invocation {
        global: globals(Some(config), None),
        action: Action::Remove { src, dst: None },
    })
    .await
    .unwrap();

    assert!(dir.path().join("cat-cutout.png").exists());
    assert_eq!(service.requests()[0].header("x-api-key"), Some("file-key"));
}
