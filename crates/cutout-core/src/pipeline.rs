//! Background removal orchestration
//!
//! Resolver → transformer → installer, strictly in sequence. Each stage
//! returns a typed failure and nothing loops back. The target's busy flag is
//! held for the whole invocation and released however it ends.

use crate::busy::{BusyFlags, BusyState};
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::installer::{DerivedAssetInstaller, InstallOutcome};
use crate::resolver::SourceResolver;
use cutout_asset::{Costume, Target, TargetId};
use cutout_host::{AssetCache, AssetLoader, AssetRegistry, MemoryStorage, Renderer, SkinRenderer};
use cutout_transform::{TransformRequest, Transformer};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// The host collaborators a pipeline talks to
#[derive(Clone)]
pub struct HostHandles {
    pub cache: Arc<dyn AssetCache>,
    pub loader: Arc<dyn AssetLoader>,
    pub registry: Arc<dyn AssetRegistry>,
    pub renderer: Arc<dyn Renderer>,
}

impl HostHandles {
    /// Use the in-memory host for every role
    #[must_use]
    pub fn in_memory(storage: Arc<MemoryStorage>, renderer: Arc<SkinRenderer>) -> Self {
        Self {
            cache: storage.clone(),
            loader: storage.clone(),
            registry: storage,
            renderer,
        }
    }
}

impl std::fmt::Debug for HostHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostHandles").finish_non_exhaustive()
    }
}

/// Removes the background of a target's current costume
pub struct BackgroundRemover {
    resolver: SourceResolver,
    transformer: Arc<dyn Transformer>,
    installer: DerivedAssetInstaller,
    busy: BusyFlags,
}

impl BackgroundRemover {
    #[must_use]
    pub fn new(host: HostHandles, transformer: Arc<dyn Transformer>, config: &PipelineConfig) -> Self {
        Self {
            resolver: SourceResolver::new(host.cache, host.loader).with_load_timeout(config.load_timeout),
            transformer,
            installer: DerivedAssetInstaller::new(host.registry, host.renderer)
                .with_decode_timeout(config.decode_timeout)
                .with_name_suffix(config.name_suffix.clone()),
            busy: BusyFlags::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn busy(&self) -> &BusyFlags {
        &self.busy
    }

    /// Busy state of one target
    #[must_use]
    pub fn state(&self, target: TargetId) -> BusyState {
        self.busy.state(target)
    }

    /// Run the whole pipeline on the target's current costume
    ///
    /// # Errors
    /// Returns the first stage failure; see [`crate::PipelineError`]
    pub async fn remove_background(&self, target: &mut Target) -> PipelineResult<InstallOutcome> {
        let _guard = self.busy.try_acquire(target.id())?;
        let source = target.current_costume().clone();
        let span = tracing::info_span!(
            "remove_background",
            sprite = %target.name(),
            costume = %source.name()
        );

        async {
            let started = Instant::now();
            let result = self.run(target, &source).await;
            match &result {
                Ok(outcome) => tracing::info!(
                    costume = %outcome.costume.name(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "background removed"
                ),
                Err(e) => tracing::error!(
                    error = %e,
                    category = ?e.category(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "background removal failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, target: &mut Target, source: &Costume) -> PipelineResult<InstallOutcome> {
        let resolved = self.resolver.resolve(source).await?;
        let request = TransformRequest::new(resolved.bytes, resolved.filename).with_format(resolved.format);
        let output = self.transformer.transform(request).await?;
        self.installer.install(target, source, output).await
    }
}

impl std::fmt::Debug for BackgroundRemover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRemover")
            .field("resolver", &self.resolver)
            .field("installer", &self.installer)
            .field("busy", &self.busy)
            .finish_non_exhaustive()
    }
}
