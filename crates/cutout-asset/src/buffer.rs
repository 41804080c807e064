//! Byte containers
//!
//! [`ImageBytes`] is the only byte type that crosses stage boundaries.
//! [`HostBuffer`] models the shapes in which a host may keep resident data;
//! [`HostBuffer::to_image_bytes`] is the adapter that normalizes them.

use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

/// Encoded image bytes, cheap to clone
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageBytes(Arc<[u8]>);

impl ImageBytes {
    /// Create from byte vector
    #[inline]
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self(data.into())
    }

    /// Get reference to bytes
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Copy out into an owned vector
    #[inline]
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Get content length
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for ImageBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ImageBytes({} bytes)", self.0.len())
    }
}

impl Deref for ImageBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for ImageBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ImageBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for ImageBytes {
    fn from(data: &[u8]) -> Self {
        Self(data.into())
    }
}

impl From<Arc<[u8]>> for ImageBytes {
    fn from(data: Arc<[u8]>) -> Self {
        Self(data)
    }
}

/// Resident data as the host stores it
#[derive(Clone, PartialEq, Eq)]
pub enum HostBuffer {
    /// Tightly packed bytes owned by the asset
    Packed(Vec<u8>),
    /// A shared buffer whose whole extent is the payload
    Shared(Arc<[u8]>),
    /// A window into a larger shared buffer
    View {
        buffer: Arc<[u8]>,
        offset: usize,
        len: usize,
    },
}

impl HostBuffer {
    /// Number of payload bytes this buffer claims to hold
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Packed(data) => data.len(),
            Self::Shared(data) => data.len(),
            Self::View { len, .. } => *len,
        }
    }

    /// Check if the claimed payload is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize into [`ImageBytes`]
    ///
    /// A shared buffer is reused without copying.
    ///
    /// # Errors
    /// Returns error if the buffer is empty or a view lies outside its buffer
    pub fn to_image_bytes(&self) -> Result<ImageBytes, BufferError> {
        let bytes = match self {
            Self::Packed(data) => ImageBytes::from(data.as_slice()),
            Self::Shared(data) => ImageBytes::from(Arc::clone(data)),
            Self::View {
                buffer,
                offset,
                len,
            } => {
                let end = offset.checked_add(*len).filter(|end| *end <= buffer.len()).ok_or(
                    BufferError::ViewOutOfBounds {
                        offset: *offset,
                        len: *len,
                        capacity: buffer.len(),
                    },
                )?;
                ImageBytes::from(&buffer[*offset..end])
            }
        };

        if bytes.is_empty() {
            return Err(BufferError::Empty);
        }
        Ok(bytes)
    }
}

impl Debug for HostBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packed(data) => write!(f, "Packed({} bytes)", data.len()),
            Self::Shared(data) => write!(f, "Shared({} bytes)", data.len()),
            Self::View {
                buffer,
                offset,
                len,
            } => write!(f, "View({len} bytes at {offset} of {})", buffer.len()),
        }
    }
}

impl From<Vec<u8>> for HostBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::Packed(data)
    }
}

impl From<ImageBytes> for HostBuffer {
    fn from(bytes: ImageBytes) -> Self {
        Self::Shared(bytes.0)
    }
}

/// Errors raised while normalizing host buffers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// Buffer holds no bytes
    #[error("buffer is empty")]
    Empty,

    /// View window does not fit its backing buffer
    #[error("view of {len} bytes at offset {offset} exceeds buffer of {capacity} bytes")]
    ViewOutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },
}
