//! Cutout Core - Background Removal Pipeline
//!
//! The orchestrator that:
//! - Resolves a costume's bytes through prioritized fallbacks
//! - Sends them to the remote transform service
//! - Installs the result as a new variant without touching the original
//! - Tracks a busy flag per target
//!
//! # Example
//!
//! ```rust,ignore
//! use cutout_core::{BackgroundRemover, HostHandles, PipelineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let host = HostHandles::in_memory(storage, renderer);
//! let remover = BackgroundRemover::new(host, Arc::new(client), &PipelineConfig::new());
//!
//! let outcome = remover.remove_background(&mut target).await?;
//! println!("installed {}", outcome.costume.name());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod busy;
pub mod config;
pub mod deadline;
pub mod error;
pub mod installer;
pub mod pipeline;
pub mod resolver;

// Re-exports for convenience
pub use busy::{BusyFlags, BusyGuard, BusyState};
pub use config::{PipelineConfig, DEFAULT_DECODE_TIMEOUT, DEFAULT_NAME_SUFFIX};
pub use deadline::{with_deadline, DeadlineExceeded};
pub use error::{FailureCategory, PipelineError, PipelineResult};
pub use installer::{DerivedAssetInstaller, InstallMode, InstallOutcome};
pub use pipeline::{BackgroundRemover, HostHandles};
pub use resolver::{Attempt, AttemptOutcome, ResolvedSource, SourceResolver, Strategy, DEFAULT_LOAD_TIMEOUT};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the pipeline
    pub use crate::{
        BackgroundRemover, FailureCategory, HostHandles, InstallMode, InstallOutcome, PipelineConfig,
        PipelineError,
    };
    pub use cutout_asset::{Costume, CostumeList, DataFormat, Target};
    pub use cutout_transform::{Transformer, TransformRequest};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
