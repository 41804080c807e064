//! `cutout remove`: one file in, one file out

use anyhow::{Context, Result};
use cutout_asset::{DataFormat, ImageBytes};
use cutout_transform::{TransformRequest, Transformer};
use std::path::{Path, PathBuf};

/// `<stem>-cutout.<ext>` next to `src`
///
/// The extension follows the response format: `jpg` for JPEG, `png` otherwise.
#[must_use]
pub fn default_output_path(src: &Path, output: &DataFormat) -> PathBuf {
    let stem = src
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    let ext = match output {
        DataFormat::Jpeg => "jpg",
        _ => "png",
    };
    src.with_file_name(format!("{stem}-cutout.{ext}"))
}

/// Send `src` to the service and write the result
///
/// # Errors
/// Returns error if the file cannot be read, the service call fails or the
/// result cannot be written
pub async fn run_remove(transformer: &dyn Transformer, src: &Path, dst: Option<&Path>) -> Result<PathBuf> {
    let data = tokio::fs::read(src)
        .await
        .with_context(|| format!("reading {}", src.display()))?;
    let filename = src
        .file_name()
        .map_or_else(|| "input.png".to_string(), |n| n.to_string_lossy().into_owned());

    let mut request = TransformRequest::new(ImageBytes::from(data), filename);
    if let Some(ext) = src.extension() {
        request = request.with_format(DataFormat::parse(&ext.to_string_lossy()));
    }

    let output = transformer
        .transform(request)
        .await
        .with_context(|| format!("removing background from {}", src.display()))?;

    let dst = dst.map_or_else(|| default_output_path(src, &output.format), Path::to_path_buf);
    tokio::fs::write(&dst, output.bytes.as_slice())
        .await
        .with_context(|| format!("writing {}", dst.display()))?;

    tracing::info!(
        src = %src.display(),
        dst = %dst.display(),
        bytes = output.bytes.len(),
        "wrote cutout"
    );
    Ok(dst)
}
