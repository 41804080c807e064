//! Content-addressed asset store on the filesystem
//!
//! Files are named by their [`StorageKey`] (`{id}.{extension}`), so the
//! directory doubles as a loader for assets persisted earlier.

use crate::error::{HostError, HostResult};
use crate::traits::AssetLoader;
use async_trait::async_trait;
use cutout_asset::{Asset, HostBuffer, StorageKey};
use std::path::{Path, PathBuf};

/// Directory of assets named by storage key
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Use `root` as the store directory
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a key is stored at
    #[must_use]
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// Write an asset's resident bytes under its storage key
    ///
    /// # Errors
    /// Returns error if the asset has no bytes or the write fails
    pub async fn save(&self, asset: &Asset) -> HostResult<PathBuf> {
        let bytes = asset
            .bytes()?
            .ok_or_else(|| HostError::NotFound(asset.storage_key().to_string()))?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| HostError::io_error(&self.root, e))?;

        let path = self.path_for(&asset.storage_key());
        tokio::fs::write(&path, bytes.as_slice())
            .await
            .map_err(|e| HostError::io_error(&path, e))?;
        Ok(path)
    }
}

#[async_trait]
impl AssetLoader for DirectoryStore {
    async fn load(&self, key: &StorageKey) -> HostResult<HostBuffer> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(HostBuffer::Packed(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(HostError::NotFound(key.to_string()))
            }
            Err(e) => Err(HostError::io_error(path, e)),
        }
    }
}
