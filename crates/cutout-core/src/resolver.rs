//! Source resolution
//!
//! Produces a costume's encoded bytes by trying, in order:
//! 1. Bytes already resident on the costume's asset
//! 2. The host's keyed cache, by asset id
//! 3. The content-addressed loader, under a deadline
//!
//! The first strategy that yields bytes wins. Host caches are only read.

use crate::deadline::with_deadline;
use crate::error::{PipelineError, PipelineResult};
use cutout_asset::{Costume, DataFormat, ImageBytes};
use cutout_host::{AssetCache, AssetLoader};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default loader deadline
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(4);

/// Where the bytes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Resident,
    Cache,
    Loader,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resident => "resident",
            Self::Cache => "cache",
            Self::Loader => "loader",
        })
    }
}

/// Why a strategy did not produce bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Nothing there
    Missing,
    /// Not attempted
    Skipped(String),
    /// Tried and errored
    Failed(String),
    /// The loader missed its deadline
    TimedOut(Duration),
}

/// One unsuccessful strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: Strategy,
    pub outcome: AttemptOutcome,
}

impl Attempt {
    #[must_use]
    pub fn new(strategy: Strategy, outcome: AttemptOutcome) -> Self {
        Self { strategy, outcome }
    }
}

impl Display for Attempt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Missing => write!(f, "{}: missing", self.strategy),
            AttemptOutcome::Skipped(why) => write!(f, "{}: skipped ({why})", self.strategy),
            AttemptOutcome::Failed(why) => write!(f, "{}: failed ({why})", self.strategy),
            AttemptOutcome::TimedOut(after) => write!(f, "{}: timed out after {after:?}", self.strategy),
        }
    }
}

/// Bytes ready to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub bytes: ImageBytes,
    pub format: DataFormat,
    pub strategy: Strategy,
    /// Upload filename, `costume.<ext>`
    pub filename: String,
}

/// Resolves costume bytes through prioritized fallbacks
#[derive(Clone)]
pub struct SourceResolver {
    cache: Arc<dyn AssetCache>,
    loader: Arc<dyn AssetLoader>,
    load_timeout: Duration,
}

impl SourceResolver {
    #[must_use]
    pub fn new(cache: Arc<dyn AssetCache>, loader: Arc<dyn AssetLoader>) -> Self {
        Self {
            cache,
            loader,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn load_timeout(&self) -> Duration {
        self.load_timeout
    }

    /// Resolve the bytes of `costume`
    ///
    /// # Errors
    /// - [`PipelineError::UnsupportedFormat`] for vector costumes, before any
    ///   strategy runs
    /// - [`PipelineError::ResolutionFailed`] listing every attempt when all
    ///   strategies come up empty
    pub async fn resolve(&self, costume: &Costume) -> PipelineResult<ResolvedSource> {
        let format = costume.format().clone();
        if !format.is_raster() {
            tracing::warn!(format = %format, "vector costume; convert to bitmap first");
            return Err(PipelineError::UnsupportedFormat { format });
        }

        let mut attempts = Vec::with_capacity(3);
        for strategy in [Strategy::Resident, Strategy::Cache, Strategy::Loader] {
            let started = Instant::now();
            match self.attempt(strategy, costume).await {
                Ok(bytes) => {
                    tracing::debug!(
                        %strategy,
                        bytes = bytes.len(),
                        elapsed_ms = started.elapsed().as_millis(),
                        "resolved costume bytes"
                    );
                    return Ok(ResolvedSource {
                        filename: upload_filename(&format),
                        bytes,
                        format,
                        strategy,
                    });
                }
                Err(outcome) => {
                    let attempt = Attempt::new(strategy, outcome);
                    match attempt.outcome {
                        AttemptOutcome::Missing | AttemptOutcome::Skipped(_) => {
                            tracing::debug!(%attempt, elapsed_ms = started.elapsed().as_millis(), "strategy yielded nothing");
                        }
                        AttemptOutcome::Failed(_) | AttemptOutcome::TimedOut(_) => {
                            tracing::warn!(%attempt, elapsed_ms = started.elapsed().as_millis(), "strategy failed");
                        }
                    }
                    attempts.push(attempt);
                }
            }
        }

        Err(PipelineError::ResolutionFailed { attempts })
    }

    async fn attempt(&self, strategy: Strategy, costume: &Costume) -> Result<ImageBytes, AttemptOutcome> {
        match strategy {
            Strategy::Resident => costume
                .asset()
                .bytes()
                .map_err(|e| AttemptOutcome::Failed(e.to_string()))?
                .ok_or(AttemptOutcome::Missing),
            Strategy::Cache => {
                let cached = self
                    .cache
                    .get(costume.asset_id())
                    .await
                    .ok_or(AttemptOutcome::Missing)?;
                cached
                    .bytes()
                    .map_err(|e| AttemptOutcome::Failed(e.to_string()))?
                    .ok_or(AttemptOutcome::Missing)
            }
            Strategy::Loader => {
                if costume.format().extension().is_empty() {
                    return Err(AttemptOutcome::Skipped("format unknown".to_string()));
                }
                let key = costume.asset().storage_key();
                let buffer = with_deadline("asset load", self.load_timeout, self.loader.load(&key))
                    .await
                    .map_err(|e| AttemptOutcome::TimedOut(e.after))?
                    .map_err(|e| AttemptOutcome::Failed(e.to_string()))?;
                buffer
                    .to_image_bytes()
                    .map_err(|e| AttemptOutcome::Failed(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for SourceResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceResolver")
            .field("load_timeout", &self.load_timeout)
            .finish_non_exhaustive()
    }
}

fn upload_filename(format: &DataFormat) -> String {
    match format.extension() {
        "" => "costume.png".to_string(),
        ext => format!("costume.{ext}"),
    }
}
