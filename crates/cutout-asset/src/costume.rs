//! Costumes and the append-only costume list
//!
//! A [`Costume`] pairs an [`Asset`] with display metadata. A
//! [`CostumeList`] holds the variants of one owning target; it can only
//! grow, and its selected index always refers to an existing entry.

use crate::asset::Asset;
use crate::format::DataFormat;
use crate::hash::AssetId;
use crate::target::SkinId;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique costume identifier (ULID, fresh per variant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CostumeId(pub Ulid);

impl CostumeId {
    /// Generate new costume ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for CostumeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CostumeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rotation anchor, opaque to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationCenter {
    pub x: f64,
    pub y: f64,
}

impl RotationCenter {
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One variant of a target's appearance
#[derive(Debug, Clone, PartialEq)]
pub struct Costume {
    id: CostumeId,
    name: String,
    asset: Asset,
    bitmap_resolution: u32,
    rotation_center: Option<RotationCenter>,
    skin: Option<SkinId>,
}

impl Costume {
    /// Create costume with resolution 1 and no anchor
    #[must_use]
    pub fn new(name: impl Into<String>, asset: Asset) -> Self {
        Self {
            id: CostumeId::new(),
            name: name.into(),
            asset,
            bitmap_resolution: 1,
            rotation_center: None,
            skin: None,
        }
    }

    /// With bitmap resolution (clamped to at least 1)
    #[inline]
    #[must_use]
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.bitmap_resolution = resolution.max(1);
        self
    }

    /// With rotation anchor
    #[inline]
    #[must_use]
    pub fn with_rotation_center(mut self, center: RotationCenter) -> Self {
        self.rotation_center = Some(center);
        self
    }

    /// With display skin
    #[inline]
    #[must_use]
    pub fn with_skin(mut self, skin: SkinId) -> Self {
        self.skin = Some(skin);
        self
    }

    /// Build a derived variant from this one
    ///
    /// The result gets a fresh id, the name `"{name}{suffix}"`, the given
    /// asset and skin, and this costume's resolution and rotation anchor.
    #[must_use]
    pub fn derive(&self, suffix: &str, asset: Asset, skin: SkinId) -> Self {
        Self {
            id: CostumeId::new(),
            name: format!("{}{suffix}", self.name),
            asset,
            bitmap_resolution: self.bitmap_resolution,
            rotation_center: self.rotation_center,
            skin: Some(skin),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> CostumeId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    /// Shortcut for the asset's id
    #[inline]
    #[must_use]
    pub fn asset_id(&self) -> &AssetId {
        self.asset.id()
    }

    /// Format tag of the underlying asset
    #[inline]
    #[must_use]
    pub fn format(&self) -> &DataFormat {
        self.asset.format()
    }

    #[inline]
    #[must_use]
    pub fn bitmap_resolution(&self) -> u32 {
        self.bitmap_resolution
    }

    #[inline]
    #[must_use]
    pub fn rotation_center(&self) -> Option<RotationCenter> {
        self.rotation_center
    }

    #[inline]
    #[must_use]
    pub fn skin(&self) -> Option<SkinId> {
        self.skin
    }
}

/// Errors raised by costume list operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostumeError {
    /// A list must hold at least one costume
    #[error("costume list cannot be empty")]
    Empty,

    /// Index does not refer to an entry
    #[error("costume index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Costume id already present
    #[error("costume {0} already present")]
    DuplicateCostume(CostumeId),

    /// Asset id already held by another variant
    #[error("asset {0} already held by this target")]
    DuplicateAsset(AssetId),
}

/// Ordered, append-only list of costume variants with a selection
///
/// # Invariants
/// - Never empty
/// - `current` is always `< len()`
/// - Entries are never removed or reordered
/// - Costume ids and asset ids are unique within the list
#[derive(Debug, Clone, PartialEq)]
pub struct CostumeList {
    costumes: Vec<Costume>,
    current: usize,
}

impl CostumeList {
    /// Create a list holding one costume, selected
    #[must_use]
    pub fn new(first: Costume) -> Self {
        Self {
            costumes: vec![first],
            current: 0,
        }
    }

    /// Create from existing variants
    ///
    /// # Errors
    /// Returns error if the list is empty, the index is out of range, or ids repeat
    pub fn from_vec(costumes: Vec<Costume>, current: usize) -> Result<Self, CostumeError> {
        let mut iter = costumes.into_iter();
        let first = iter.next().ok_or(CostumeError::Empty)?;
        let mut list = Self::new(first);
        for costume in iter {
            list.push(costume)?;
        }
        list.select(current)?;
        Ok(list)
    }

    /// Check whether `costume` could be appended
    ///
    /// # Errors
    /// Returns error if its costume id or asset id is already present
    pub fn check_append(&self, costume: &Costume) -> Result<(), CostumeError> {
        for existing in &self.costumes {
            if existing.id == costume.id {
                return Err(CostumeError::DuplicateCostume(costume.id));
            }
            if existing.asset_id() == costume.asset_id() {
                return Err(CostumeError::DuplicateAsset(*costume.asset_id()));
            }
        }
        Ok(())
    }

    /// Append a costume, returning its index
    ///
    /// The selection is left unchanged.
    ///
    /// # Errors
    /// Returns error if its costume id or asset id is already present
    pub fn push(&mut self, costume: Costume) -> Result<usize, CostumeError> {
        self.check_append(&costume)?;
        self.costumes.push(costume);
        Ok(self.costumes.len() - 1)
    }

    /// Select the costume at `index`
    ///
    /// # Errors
    /// Returns error if `index` is out of range; the selection is unchanged
    pub fn select(&mut self, index: usize) -> Result<(), CostumeError> {
        if index >= self.costumes.len() {
            return Err(CostumeError::IndexOutOfRange {
                index,
                len: self.costumes.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    /// Selected costume
    #[inline]
    #[must_use]
    pub fn current(&self) -> &Costume {
        &self.costumes[self.current]
    }

    /// Selected index
    #[inline]
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Costume> {
        self.costumes.get(index)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.costumes.len()
    }

    /// Always false; present for API symmetry with `len`
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.costumes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Costume> {
        self.costumes.iter()
    }
}

impl<'a> IntoIterator for &'a CostumeList {
    type Item = &'a Costume;
    type IntoIter = std::slice::Iter<'a, Costume>;

    fn into_iter(self) -> Self::IntoIter {
        self.costumes.iter()
    }
}
