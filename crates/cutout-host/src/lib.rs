//! Cutout Host Layer
//!
//! The boundary between the pipeline and the editor that owns assets and
//! rendering.
//!
//! # Collaborators
//!
//! - [`AssetCache`]: keyed content cache, read-only from the pipeline's side
//! - [`AssetLoader`]: content-addressed loader keyed by `{id}.{extension}`
//! - [`AssetRegistry`]: registers newly produced assets
//! - [`Renderer`]: skins, drawable bindings and redraws
//!
//! # Architecture
//!
//! ```text
//! Costume ──▶ AssetCache / AssetLoader ──▶ bytes
//!                                            │ (remote transform)
//!                                            ▼
//!             AssetRegistry + Renderer ◀── result bytes
//! ```
//!
//! [`MemoryStorage`], [`SkinRenderer`] and [`DirectoryStore`] are complete
//! in-process implementations used by the CLI and by tests.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod directory;
pub mod error;
pub mod renderer;
pub mod storage;
pub mod traits;

pub use directory::DirectoryStore;
pub use error::{HostError, HostResult};
pub use renderer::{SkinInfo, SkinRenderer};
pub use storage::{MemoryStorage, StorageStats};
pub use traits::{AssetCache, AssetLoader, AssetRegistry, Renderer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for implementing or driving a host
    pub use crate::error::{HostError, HostResult};
    pub use crate::traits::{AssetCache, AssetLoader, AssetRegistry, Renderer};
    pub use cutout_asset::{Asset, AssetId, DataFormat, HostBuffer, ImageBytes, StorageKey};
}
