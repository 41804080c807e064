//! Derived asset installation
//!
//! Turns a transform result into a new costume variant without touching the
//! source. Every fallible step runs before the target is mutated, and a skin
//! created along the way is destroyed if a later step fails.

use crate::config::{DEFAULT_DECODE_TIMEOUT, DEFAULT_NAME_SUFFIX};
use crate::deadline::with_deadline;
use crate::error::{PipelineError, PipelineResult};
use cutout_asset::{AssetId, Capability, Costume, CostumeId, DataFormat, ImageBytes, SkinId, Target};
use cutout_host::{AssetRegistry, Renderer};
use cutout_transform::TransformOutput;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;

/// How the variant reached the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Appended to the variant list at `index` and selected
    Appended { index: usize },
    /// Skin bound straight onto the drawable; no list entry
    Rebound,
}

/// Result of a successful install
#[derive(Debug, Clone, PartialEq)]
pub struct InstallOutcome {
    pub costume_id: CostumeId,
    pub asset_id: AssetId,
    pub skin: SkinId,
    pub mode: InstallMode,
    /// The derived costume
    pub costume: Costume,
}

/// Installs transform results as new variants
#[derive(Clone)]
pub struct DerivedAssetInstaller {
    registry: Arc<dyn AssetRegistry>,
    renderer: Arc<dyn Renderer>,
    decode_timeout: Duration,
    name_suffix: String,
}

impl DerivedAssetInstaller {
    #[must_use]
    pub fn new(registry: Arc<dyn AssetRegistry>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            registry,
            renderer,
            decode_timeout: DEFAULT_DECODE_TIMEOUT,
            name_suffix: DEFAULT_NAME_SUFFIX.to_string(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_decode_timeout(mut self, timeout: Duration) -> Self {
        self.decode_timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.name_suffix = suffix.into();
        self
    }

    /// Install `output` as a variant of `source` on `target`
    ///
    /// On error the target, its drawable binding and the renderer's skins
    /// are as they were before the call.
    ///
    /// # Errors
    /// - [`PipelineError::DecodeFailed`] if the bytes are not a decodable
    ///   bitmap within the decode deadline
    /// - [`PipelineError::InstallFailed`] if the renderer or registry
    ///   refuses a step
    pub async fn install(
        &self,
        target: &mut Target,
        source: &Costume,
        output: TransformOutput,
    ) -> PipelineResult<InstallOutcome> {
        let bitmap = self.decode(output.bytes.clone()).await?;

        let skin = self
            .renderer
            .create_bitmap_skin(&bitmap, source.bitmap_resolution())
            .map_err(|e| PipelineError::InstallFailed(format!("create skin: {e}")))?;

        let format = match output.format {
            DataFormat::Jpeg => DataFormat::Jpeg,
            _ => DataFormat::Png,
        };
        let asset = match self.registry.create_asset(format, output.bytes).await {
            Ok(asset) => asset,
            Err(e) => {
                self.renderer.destroy_skin(skin);
                return Err(PipelineError::InstallFailed(format!("register asset: {e}")));
            }
        };

        let costume = source.derive(&self.name_suffix, asset, skin);
        let mode = match self.attach(target, &costume, skin) {
            Ok(mode) => mode,
            Err(e) => {
                self.renderer.destroy_skin(skin);
                return Err(e);
            }
        };
        self.renderer.request_redraw();

        tracing::info!(
            costume = %costume.name(),
            asset = %costume.asset_id().short(),
            %skin,
            ?mode,
            "installed derived costume"
        );
        Ok(InstallOutcome {
            costume_id: costume.id(),
            asset_id: *costume.asset_id(),
            skin,
            mode,
            costume,
        })
    }

    fn attach(&self, target: &mut Target, costume: &Costume, skin: SkinId) -> PipelineResult<InstallMode> {
        let drawable = target.drawable();
        match target.capability() {
            Capability::VariantList => {
                let list = target
                    .costumes_mut()
                    .ok_or_else(|| PipelineError::InstallFailed("variant list unavailable".to_string()))?;
                list.check_append(costume)
                    .map_err(|e| PipelineError::InstallFailed(e.to_string()))?;
                self.renderer
                    .update_drawable_skin(drawable, skin)
                    .map_err(|e| PipelineError::InstallFailed(format!("bind drawable: {e}")))?;
                let index = list
                    .push(costume.clone())
                    .map_err(|e| PipelineError::InstallFailed(e.to_string()))?;
                list.select(index)
                    .map_err(|e| PipelineError::InstallFailed(e.to_string()))?;
                Ok(InstallMode::Appended { index })
            }
            Capability::DirectBinding => {
                tracing::warn!(
                    target_name = %target.name(),
                    "no variant list; binding result directly to drawable"
                );
                self.renderer
                    .update_drawable_skin(drawable, skin)
                    .map_err(|e| PipelineError::InstallFailed(format!("bind drawable: {e}")))?;
                Ok(InstallMode::Rebound)
            }
        }
    }

    async fn decode(&self, bytes: ImageBytes) -> PipelineResult<RgbaImage> {
        let decoding = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes).map(|decoded| decoded.to_rgba8())
        });
        let bitmap = with_deadline("decode", self.decode_timeout, decoding)
            .await
            .map_err(|e| PipelineError::DecodeFailed(e.to_string()))?
            .map_err(|e| PipelineError::DecodeFailed(format!("decoder task: {e}")))?
            .map_err(|e| PipelineError::DecodeFailed(e.to_string()))?;

        if bitmap.width() == 0 || bitmap.height() == 0 {
            return Err(PipelineError::DecodeFailed("image has no pixels".to_string()));
        }
        Ok(bitmap)
    }
}

impl std::fmt::Debug for DerivedAssetInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedAssetInstaller")
            .field("decode_timeout", &self.decode_timeout)
            .field("name_suffix", &self.name_suffix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutout_asset::{Asset, CostumeList, DrawableId, ImageBytes, RotationCenter};
    use cutout_host::{MemoryStorage, SkinRenderer};
    use image::{DynamicImage, ImageFormat, Rgba};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> ImageBytes {
        let img = RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        ImageBytes::from(buf)
    }

    fn output(bytes: ImageBytes, format: DataFormat) -> TransformOutput {
        TransformOutput {
            content_type: format.mime().to_string(),
            bytes,
            format,
        }
    }

    struct Fixture {
        storage: Arc<MemoryStorage>,
        renderer: Arc<SkinRenderer>,
        installer: DerivedAssetInstaller,
        source: Costume,
        target: Target,
    }

    fn fixture(renderer: SkinRenderer, legacy: bool) -> Fixture {
        let storage = Arc::new(MemoryStorage::default());
        let renderer = Arc::new(renderer);
        let old_skin = renderer.create_bitmap_skin(&RgbaImage::new(2, 2), 2).unwrap();
        let source = Costume::new("cat", Asset::from_bytes(DataFormat::Jpeg, ImageBytes::from(&b"jpeg"[..])))
            .with_resolution(2)
            .with_rotation_center(RotationCenter::new(12.0, 34.0))
            .with_skin(old_skin);
        let drawable: DrawableId = renderer.add_drawable(Some(old_skin));
        let target = if legacy {
            Target::legacy("Sprite1", drawable, source.clone())
        } else {
            Target::new("Sprite1", drawable, CostumeList::new(source.clone()))
        };
        let installer = DerivedAssetInstaller::new(storage.clone(), renderer.clone());
        Fixture {
            storage,
            renderer,
            installer,
            source,
            target,
        }
    }

    #[tokio::test]
    async fn appends_and_selects_new_variant() {
        let mut f = fixture(SkinRenderer::new(), false);
        let outcome = f
            .installer
            .install(&mut f.target, &f.source, output(png(4, 4), DataFormat::Png))
            .await
            .unwrap();

        assert_eq!(outcome.mode, InstallMode::Appended { index: 1 });
        let list = f.target.costumes().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.current_index(), 1);
        assert_eq!(list.get(0), Some(&f.source));

        let derived = f.target.current_costume();
        assert_eq!(derived.name(), "cat (bg)");
        assert_eq!(derived.format(), &DataFormat::Png);
        assert_eq!(derived.bitmap_resolution(), 2);
        assert_eq!(derived.rotation_center(), Some(RotationCenter::new(12.0, 34.0)));
        assert_ne!(derived.id(), f.source.id());
        assert_eq!(f.renderer.drawable_skin(f.target.drawable()), Some(outcome.skin));
        assert_eq!(f.renderer.redraw_count(), 1);
        assert!(f.storage.contains(&outcome.asset_id).await);
    }

    #[tokio::test]
    async fn jpeg_response_registers_jpeg_asset() {
        let mut f = fixture(SkinRenderer::new(), false);
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(image::RgbImage::new(3, 3))
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();

        let outcome = f
            .installer
            .install(&mut f.target, &f.source, output(ImageBytes::from(jpeg), DataFormat::Jpeg))
            .await
            .unwrap();
        assert_eq!(outcome.costume.format(), &DataFormat::Jpeg);
    }

    #[tokio::test]
    async fn undecodable_result_changes_nothing() {
        let mut f = fixture(SkinRenderer::new(), false);
        let skins_before = f.renderer.skin_count();

        let err = f
            .installer
            .install(&mut f.target, &f.source, output(ImageBytes::from(&b"not a png"[..]), DataFormat::Png))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::DecodeFailed(_)));
        assert_eq!(f.target.costumes().unwrap().len(), 1);
        assert_eq!(f.target.costumes().unwrap().current_index(), 0);
        assert_eq!(f.renderer.skin_count(), skins_before);
        assert_eq!(f.storage.stats().created, 0);
        assert_eq!(f.renderer.redraw_count(), 0);
    }

    #[tokio::test]
    async fn rejected_skin_is_install_failure() {
        let mut f = fixture(SkinRenderer::new(), false);
        let renderer = Arc::new(SkinRenderer::new().rejecting_skins());
        let installer = DerivedAssetInstaller::new(f.storage.clone(), renderer);

        let err = installer
            .install(&mut f.target, &f.source, output(png(2, 2), DataFormat::Png))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InstallFailed(_)));
        assert_eq!(f.target.costumes().unwrap().len(), 1);
        assert_eq!(f.storage.stats().created, 0);
    }

    #[tokio::test]
    async fn rejected_binding_rolls_back_skin() {
        let mut f = fixture(SkinRenderer::new().rejecting_bindings(), false);
        let old_skin = f.renderer.drawable_skin(f.target.drawable());
        let skins_before = f.renderer.skin_count();

        let err = f
            .installer
            .install(&mut f.target, &f.source, output(png(2, 2), DataFormat::Png))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InstallFailed(_)));
        assert_eq!(f.target.costumes().unwrap().len(), 1);
        assert_eq!(f.renderer.skin_count(), skins_before);
        assert_eq!(f.renderer.drawable_skin(f.target.drawable()), old_skin);
    }

    #[tokio::test]
    async fn legacy_target_rebinds_drawable() {
        let mut f = fixture(SkinRenderer::new(), true);
        let outcome = f
            .installer
            .install(&mut f.target, &f.source, output(png(2, 2), DataFormat::Png))
            .await
            .unwrap();

        assert_eq!(outcome.mode, InstallMode::Rebound);
        assert_eq!(f.renderer.drawable_skin(f.target.drawable()), Some(outcome.skin));
        assert_eq!(f.target.current_costume(), &f.source);
        assert_eq!(f.renderer.redraw_count(), 1);
    }

    #[tokio::test]
    async fn custom_suffix() {
        let mut f = fixture(SkinRenderer::new(), false);
        let installer = f.installer.clone().with_name_suffix(" [cutout]");
        let outcome = installer
            .install(&mut f.target, &f.source, output(png(2, 2), DataFormat::Png))
            .await
            .unwrap();
        assert_eq!(outcome.costume.name(), "cat [cutout]");
    }

    #[tokio::test]
    async fn repeated_result_is_rejected_as_duplicate_asset() {
        let mut f = fixture(SkinRenderer::new(), false);
        let bytes = png(2, 2);
        f.installer
            .install(&mut f.target, &f.source, output(bytes.clone(), DataFormat::Png))
            .await
            .unwrap();
        let skins_before = f.renderer.skin_count();

        let err = f
            .installer
            .install(&mut f.target, &f.source, output(bytes, DataFormat::Png))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InstallFailed(_)));
        assert_eq!(f.target.costumes().unwrap().len(), 2);
        assert_eq!(f.renderer.skin_count(), skins_before);
    }
}
