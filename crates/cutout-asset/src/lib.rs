//! Cutout Asset Model
//!
//! Content-addressed image assets and the costume variants that reference them.
//!
//! # Core Concepts
//!
//! - [`Asset`]: Immutable image blob keyed by its [`AssetId`]
//! - [`HostBuffer`]: Resident bytes in whatever shape the host keeps them
//! - [`ImageBytes`]: The single normalized byte type passed between stages
//! - [`Costume`]: An asset plus display metadata (resolution, rotation anchor, skin)
//! - [`CostumeList`]: Append-only variant list with a always-valid selection
//! - [`Target`]: Owning entity; its [`Capability`] picks the install strategy
//!
//! # Example
//!
//! ```rust,ignore
//! use cutout_asset::{Asset, Costume, CostumeList, DataFormat, DrawableId, Target};
//!
//! let asset = Asset::from_bytes(DataFormat::Png, png_bytes.into());
//! let target = Target::new("Sprite1", DrawableId(1), CostumeList::new(Costume::new("cat", asset)));
//! assert_eq!(target.current_costume().name(), "cat");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod asset;
mod buffer;
mod costume;
mod format;
mod hash;
mod target;

pub use asset::{Asset, StorageKey};
pub use buffer::{BufferError, HostBuffer, ImageBytes};
pub use costume::{Costume, CostumeError, CostumeId, CostumeList, RotationCenter};
pub use format::DataFormat;
pub use hash::{AssetId, AssetIdError};
pub use target::{Capability, DrawableId, SkinId, Target, TargetId, Wardrobe};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
