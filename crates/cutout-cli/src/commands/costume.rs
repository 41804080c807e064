//! `cutout costume`: the full pipeline against an in-memory host
//!
//! The image becomes the only costume of a throwaway target. On success the
//! new variant's bytes are written into the output directory under their
//! storage key.

use anyhow::{Context, Result};
use cutout_asset::{Asset, Costume, CostumeList, DataFormat, ImageBytes, Target};
use cutout_core::{BackgroundRemover, HostHandles, InstallOutcome, PipelineConfig};
use cutout_host::{DirectoryStore, MemoryStorage, SkinRenderer};
use cutout_transform::Transformer;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Target name used for the throwaway sprite
const SPRITE_NAME: &str = "cutout";

/// Inputs of one `costume` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostumeRun {
    pub src: PathBuf,
    /// Costume name; the file stem when absent
    pub name: Option<String>,
    /// Use a target without a variant list
    pub legacy: bool,
    /// Destination directory; the source's directory when absent
    pub out: Option<PathBuf>,
}

impl CostumeRun {
    #[must_use]
    pub fn new(src: impl Into<PathBuf>) -> Self {
        Self {
            src: src.into(),
            name: None,
            legacy: false,
            out: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn legacy(mut self, legacy: bool) -> Self {
        self.legacy = legacy;
        self
    }

    #[must_use]
    pub fn with_out(mut self, out: impl Into<PathBuf>) -> Self {
        self.out = Some(out.into());
        self
    }

    fn costume_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.src
                .file_stem()
                .map_or_else(|| "costume1".to_string(), |s| s.to_string_lossy().into_owned())
        })
    }

    fn out_dir(&self) -> PathBuf {
        self.out.clone().unwrap_or_else(|| {
            self.src
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        })
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct CostumeReport {
    pub outcome: InstallOutcome,
    /// Where the new asset was written
    pub saved: PathBuf,
    /// Variant count after the run; 1 for legacy targets
    pub variants: usize,
}

/// Run the pipeline on `run.src`
///
/// # Errors
/// Returns error if the file cannot be read, any pipeline stage fails, or the
/// new asset cannot be written. Pipeline failures carry the user-facing
/// message as context.
pub async fn run_costume(
    transformer: Arc<dyn Transformer>,
    pipeline: &PipelineConfig,
    run: &CostumeRun,
) -> Result<CostumeReport> {
    let data = tokio::fs::read(&run.src)
        .await
        .with_context(|| format!("reading {}", run.src.display()))?;
    let format = run
        .src
        .extension()
        .map_or(DataFormat::Png, |ext| DataFormat::parse(&ext.to_string_lossy()));

    let storage = Arc::new(MemoryStorage::default());
    let renderer = Arc::new(SkinRenderer::new());
    let remover = BackgroundRemover::new(
        HostHandles::in_memory(storage, renderer.clone()),
        transformer,
        pipeline,
    );

    let costume = Costume::new(run.costume_name(), Asset::from_bytes(format, ImageBytes::from(data)));
    let drawable = renderer.add_drawable(costume.skin());
    let mut target = if run.legacy {
        Target::legacy(SPRITE_NAME, drawable, costume)
    } else {
        Target::new(SPRITE_NAME, drawable, CostumeList::new(costume))
    };

    let outcome = match remover.remove_background(&mut target).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let message = e.user_message();
            return Err(anyhow::Error::new(e).context(message));
        }
    };

    let store = DirectoryStore::new(run.out_dir());
    let saved = store
        .save(outcome.costume.asset())
        .await
        .with_context(|| format!("saving {} into {}", outcome.costume.name(), store.root().display()))?;

    Ok(CostumeReport {
        variants: target.costumes().map_or(1, CostumeList::len),
        outcome,
        saved,
    })
}
