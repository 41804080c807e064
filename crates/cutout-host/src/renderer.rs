//! Software renderer that records skins and drawable bindings

use crate::error::{HostError, HostResult};
use crate::traits::Renderer;
use cutout_asset::{DrawableId, SkinId};
use dashmap::DashMap;
use image::RgbaImage;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// What the renderer knows about a skin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinInfo {
    pub width: u32,
    pub height: u32,
    pub resolution: u32,
}

/// In-memory renderer
///
/// Drawables must be added before they can be bound. Bindings only change
/// when [`Renderer::update_drawable_skin`] succeeds.
#[derive(Debug, Default)]
pub struct SkinRenderer {
    skins: DashMap<SkinId, SkinInfo>,
    drawables: DashMap<DrawableId, Option<SkinId>>,
    next_id: AtomicU64,
    redraws: AtomicU64,
    reject_skins: AtomicBool,
    reject_bindings: AtomicBool,
}

impl SkinRenderer {
    /// Create an empty renderer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every subsequent skin creation
    #[must_use]
    pub fn rejecting_skins(self) -> Self {
        self.reject_skins.store(true, Ordering::SeqCst);
        self
    }

    /// Refuse every subsequent drawable rebinding
    #[must_use]
    pub fn rejecting_bindings(self) -> Self {
        self.reject_bindings.store(true, Ordering::SeqCst);
        self
    }

    /// Register a drawable, optionally already showing `skin`
    pub fn add_drawable(&self, skin: Option<SkinId>) -> DrawableId {
        let id = DrawableId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.drawables.insert(id, skin);
        id
    }

    /// Skin currently bound to `drawable`
    #[must_use]
    pub fn drawable_skin(&self, drawable: DrawableId) -> Option<SkinId> {
        self.drawables.get(&drawable).and_then(|entry| *entry.value())
    }

    /// Details of a live skin
    #[must_use]
    pub fn skin(&self, skin: SkinId) -> Option<SkinInfo> {
        self.skins.get(&skin).map(|entry| *entry.value())
    }

    /// Number of live skins
    #[must_use]
    pub fn skin_count(&self) -> usize {
        self.skins.len()
    }

    /// Number of redraw requests received
    #[must_use]
    pub fn redraw_count(&self) -> u64 {
        self.redraws.load(Ordering::SeqCst)
    }
}

impl Renderer for SkinRenderer {
    fn create_bitmap_skin(&self, bitmap: &RgbaImage, resolution: u32) -> HostResult<SkinId> {
        if self.reject_skins.load(Ordering::SeqCst) {
            return Err(HostError::SkinCreation("renderer refused skin".to_string()));
        }
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return Err(HostError::SkinCreation("bitmap has no pixels".to_string()));
        }

        let id = SkinId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.skins.insert(
            id,
            SkinInfo {
                width: bitmap.width(),
                height: bitmap.height(),
                resolution: resolution.max(1),
            },
        );
        tracing::trace!(%id, width = bitmap.width(), height = bitmap.height(), "created skin");
        Ok(id)
    }

    fn update_drawable_skin(&self, drawable: DrawableId, skin: SkinId) -> HostResult<()> {
        if !self.skins.contains_key(&skin) {
            return Err(HostError::UnknownSkin(skin));
        }
        let mut entry = self
            .drawables
            .get_mut(&drawable)
            .ok_or(HostError::UnknownDrawable(drawable))?;
        if self.reject_bindings.load(Ordering::SeqCst) {
            return Err(HostError::BindingRejected {
                drawable,
                skin,
                reason: "drawable is locked".to_string(),
            });
        }
        *entry.value_mut() = Some(skin);
        Ok(())
    }

    fn destroy_skin(&self, skin: SkinId) {
        self.skins.remove(&skin);
    }

    fn request_redraw(&self) {
        self.redraws.fetch_add(1, Ordering::SeqCst);
    }
}
