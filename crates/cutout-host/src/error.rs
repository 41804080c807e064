//! Error types for host collaborators
//!
//! One enum covers every failure a host can report back to the pipeline:
//! - Loader misses and I/O failures
//! - Registry rejections
//! - Renderer rejections (skin creation, drawable binding)

use cutout_asset::{BufferError, DrawableId, SkinId};
use std::path::PathBuf;

/// Errors reported by host collaborators
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// No content stored under the key
    #[error("asset not found: {0}")]
    NotFound(String),

    /// IO error while loading or persisting
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes could not be normalized
    #[error("malformed buffer: {0}")]
    Buffer(#[from] BufferError),

    /// The registry refused a new asset
    #[error("registry rejected asset: {0}")]
    RegistryRejected(String),

    /// The renderer could not create a skin
    #[error("skin creation failed: {0}")]
    SkinCreation(String),

    /// Skin id is unknown to the renderer
    #[error("unknown skin: {0}")]
    UnknownSkin(SkinId),

    /// Drawable id is unknown to the renderer
    #[error("unknown drawable: {0}")]
    UnknownDrawable(DrawableId),

    /// The renderer refused to rebind a drawable
    #[error("binding {skin} to {drawable} rejected: {reason}")]
    BindingRejected {
        drawable: DrawableId,
        skin: SkinId,
        reason: String,
    },
}

impl HostError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for host operations
pub type HostResult<T> = Result<T, HostError>;
