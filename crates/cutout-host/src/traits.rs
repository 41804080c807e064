//! Host collaborator seams
//!
//! The pipeline never owns storage or rendering. It talks to the host
//! through these traits, which the editor (or the in-memory host in this
//! crate) implements.

use crate::error::HostResult;
use async_trait::async_trait;
use cutout_asset::{Asset, AssetId, DataFormat, DrawableId, HostBuffer, ImageBytes, SkinId, StorageKey};
use image::RgbaImage;

/// Keyed content cache indexed by asset id
#[async_trait]
pub trait AssetCache: Send + Sync {
    /// Look up a cached asset; never evicts or mutates
    async fn get(&self, id: &AssetId) -> Option<Asset>;
}

/// Content-addressed loader keyed by `{id}.{extension}`
#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Load the bytes stored under `key`
    ///
    /// # Errors
    /// Returns error if nothing is stored under the key or I/O fails
    async fn load(&self, key: &StorageKey) -> HostResult<HostBuffer>;
}

/// Registry of assets owned by the host
#[async_trait]
pub trait AssetRegistry: Send + Sync {
    /// Register bytes as a new asset and return it
    ///
    /// # Errors
    /// Returns error if the host refuses the asset
    async fn create_asset(&self, format: DataFormat, bytes: ImageBytes) -> HostResult<Asset>;

    /// Whether an asset with this id is registered
    async fn contains(&self, id: &AssetId) -> bool;
}

/// Rendering subsystem
///
/// Skins are owned by the renderer; callers only hold their ids.
pub trait Renderer: Send + Sync {
    /// Create a skin from a decoded bitmap at the given resolution
    ///
    /// # Errors
    /// Returns error if the renderer cannot allocate the skin
    fn create_bitmap_skin(&self, bitmap: &RgbaImage, resolution: u32) -> HostResult<SkinId>;

    /// Paint `drawable` with `skin` from now on
    ///
    /// # Errors
    /// Returns error if either id is unknown or the binding is refused
    fn update_drawable_skin(&self, drawable: DrawableId, skin: SkinId) -> HostResult<()>;

    /// Release a skin that never became visible
    fn destroy_skin(&self, skin: SkinId);

    /// Ask for a repaint on the next frame
    fn request_redraw(&self);
}
