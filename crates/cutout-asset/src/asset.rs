//! Immutable, content-addressed image assets

use crate::buffer::{BufferError, HostBuffer, ImageBytes};
use crate::format::DataFormat;
use crate::hash::AssetId;
use std::fmt::{self, Display, Formatter};

/// Content-addressed image blob
///
/// # Invariants
/// - When built with [`Asset::from_bytes`], `id` is the hash of the bytes
/// - Immutable after construction; clones share the resident buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    id: AssetId,
    format: DataFormat,
    data: Option<HostBuffer>,
}

impl Asset {
    /// Create a resident asset, computing its id from the content
    #[must_use]
    pub fn from_bytes(format: DataFormat, bytes: ImageBytes) -> Self {
        Self {
            id: AssetId::compute(&bytes),
            format,
            data: Some(HostBuffer::from(bytes)),
        }
    }

    /// Create an asset whose bytes are held by the host in some other shape
    ///
    /// The caller vouches that `id` matches the payload.
    #[must_use]
    pub fn with_buffer(id: AssetId, format: DataFormat, data: HostBuffer) -> Self {
        Self {
            id,
            format,
            data: Some(data),
        }
    }

    /// Create a reference to an asset whose bytes are not loaded
    #[must_use]
    pub fn reference(id: AssetId, format: DataFormat) -> Self {
        Self {
            id,
            format,
            data: None,
        }
    }

    /// Content id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Format tag
    #[inline]
    #[must_use]
    pub fn format(&self) -> &DataFormat {
        &self.format
    }

    /// Resident data, if loaded
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&HostBuffer> {
        self.data.as_ref()
    }

    /// Whether bytes are resident
    #[inline]
    #[must_use]
    pub fn is_resident(&self) -> bool {
        self.data.is_some()
    }

    /// Normalized resident bytes
    ///
    /// Returns `Ok(None)` for a reference without data.
    ///
    /// # Errors
    /// Returns error if the resident buffer is malformed
    pub fn bytes(&self) -> Result<Option<ImageBytes>, BufferError> {
        self.data.as_ref().map(HostBuffer::to_image_bytes).transpose()
    }

    /// Key under which the content-addressed loader stores this asset
    #[must_use]
    pub fn storage_key(&self) -> StorageKey {
        StorageKey::new(self.id, &self.format)
    }
}

/// Loader key of the form `{id}.{extension}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Build the key for an id and format
    #[must_use]
    pub fn new(id: AssetId, format: &DataFormat) -> Self {
        Self(format!("{id}.{}", format.extension()))
    }

    /// Key as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_hashes_content() {
        let bytes = ImageBytes::from(vec![1u8, 2, 3]);
        let asset = Asset::from_bytes(DataFormat::Png, bytes.clone());
        assert_eq!(asset.id(), &AssetId::compute(&bytes));
        assert!(asset.is_resident());
        assert_eq!(asset.bytes().unwrap(), Some(bytes));
    }

    #[test]
    fn reference_has_no_bytes() {
        let asset = Asset::reference(AssetId::compute(b"x"), DataFormat::Jpeg);
        assert!(!asset.is_resident());
        assert_eq!(asset.bytes().unwrap(), None);
    }

    #[test]
    fn malformed_buffer_surfaces_error() {
        let asset = Asset::with_buffer(
            AssetId::compute(b"x"),
            DataFormat::Png,
            HostBuffer::Packed(Vec::new()),
        );
        assert_eq!(asset.bytes(), Err(BufferError::Empty));
    }

    #[test]
    fn storage_key_format() {
        let id = AssetId::compute(b"costume");
        let asset = Asset::reference(id, DataFormat::parse("jpeg"));
        assert_eq!(asset.storage_key().as_str(), format!("{id}.jpg"));
    }
}
