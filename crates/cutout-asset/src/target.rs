//! Owning targets and display identifiers

use crate::costume::{Costume, CostumeList};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique target identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub Ulid);

impl TargetId {
    /// Generate new target ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Renderer-assigned skin (display handle) id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SkinId(pub u64);

impl std::fmt::Display for SkinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skin#{}", self.0)
    }
}

/// Renderer-assigned drawable (display instance) id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DrawableId(pub u64);

impl std::fmt::Display for DrawableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "drawable#{}", self.0)
    }
}

/// What a target lets the pipeline do with a new variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Variants can be appended and selected
    VariantList,
    /// Only the drawable's skin can be swapped
    DirectBinding,
}

/// Storage of a target's costumes
#[derive(Debug, Clone, PartialEq)]
pub enum Wardrobe {
    /// Full append-only variant list
    List(CostumeList),
    /// Legacy context exposing only the current costume
    Single(Costume),
}

/// Owning entity of costume variants
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    id: TargetId,
    name: String,
    drawable: DrawableId,
    wardrobe: Wardrobe,
}

impl Target {
    /// Create a target with a variant list
    #[must_use]
    pub fn new(name: impl Into<String>, drawable: DrawableId, costumes: CostumeList) -> Self {
        Self {
            id: TargetId::new(),
            name: name.into(),
            drawable,
            wardrobe: Wardrobe::List(costumes),
        }
    }

    /// Create a target from a legacy context without a variant list
    #[must_use]
    pub fn legacy(name: impl Into<String>, drawable: DrawableId, costume: Costume) -> Self {
        Self {
            id: TargetId::new(),
            name: name.into(),
            drawable,
            wardrobe: Wardrobe::Single(costume),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn drawable(&self) -> DrawableId {
        self.drawable
    }

    /// Capability flag selecting the install strategy
    #[inline]
    #[must_use]
    pub fn capability(&self) -> Capability {
        match self.wardrobe {
            Wardrobe::List(_) => Capability::VariantList,
            Wardrobe::Single(_) => Capability::DirectBinding,
        }
    }

    /// Currently selected costume
    #[must_use]
    pub fn current_costume(&self) -> &Costume {
        match &self.wardrobe {
            Wardrobe::List(list) => list.current(),
            Wardrobe::Single(costume) => costume,
        }
    }

    /// Variant list, if the target has one
    #[must_use]
    pub fn costumes(&self) -> Option<&CostumeList> {
        match &self.wardrobe {
            Wardrobe::List(list) => Some(list),
            Wardrobe::Single(_) => None,
        }
    }

    /// Mutable variant list, if the target has one
    #[must_use]
    pub fn costumes_mut(&mut self) -> Option<&mut CostumeList> {
        match &mut self.wardrobe {
            Wardrobe::List(list) => Some(list),
            Wardrobe::Single(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn wardrobe(&self) -> &Wardrobe {
        &self.wardrobe
    }
}
