//! In-memory asset storage using moka
//!
//! Plays the three storage roles the pipeline needs:
//! - Keyed cache of assets by content id ([`AssetCache`])
//! - Content-addressed loader backed by a byte store ([`AssetLoader`])
//! - Registry for newly created assets ([`AssetRegistry`])

use crate::error::{HostError, HostResult};
use crate::traits::{AssetCache, AssetLoader, AssetRegistry};
use async_trait::async_trait;
use cutout_asset::{Asset, AssetId, DataFormat, HostBuffer, ImageBytes, StorageKey};
use dashmap::DashMap;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for storage access
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Cache lookups served (hit or miss)
    pub cache_lookups: u64,
    /// Loader calls started
    pub loads: u64,
    /// Assets registered through [`AssetRegistry`]
    pub created: u64,
}

#[derive(Debug, Default)]
struct Counters {
    cache_lookups: AtomicU64,
    loads: AtomicU64,
    created: AtomicU64,
}

/// Host storage kept entirely in memory
///
/// The cache and the backing store are independent: an asset may be
/// loadable without being cached, or cached without resident bytes.
pub struct MemoryStorage {
    cache: Cache<AssetId, Asset>,
    store: DashMap<StorageKey, ImageBytes>,
    load_latency: Option<Duration>,
    counters: Counters,
}

impl MemoryStorage {
    /// Create storage with the given cache capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::new(max_capacity),
            store: DashMap::new(),
            load_latency: None,
            counters: Counters::default(),
        }
    }

    /// Delay every load by `latency`, like a slow backend
    #[inline]
    #[must_use]
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = Some(latency);
        self
    }

    /// Put an asset into the keyed cache
    pub async fn insert_cached(&self, asset: Asset) {
        self.cache.insert(*asset.id(), asset).await;
    }

    /// Put bytes into the loader's backing store
    pub fn store_bytes(&self, key: StorageKey, bytes: ImageBytes) {
        self.store.insert(key, bytes);
    }

    /// Bytes held in the backing store under `key`
    #[must_use]
    pub fn stored_bytes(&self, key: &StorageKey) -> Option<ImageBytes> {
        self.store.get(key).map(|entry| entry.value().clone())
    }

    /// Access counters
    #[must_use]
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            cache_lookups: self.counters.cache_lookups.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            created: self.counters.created.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("cached", &self.cache.entry_count())
            .field("stored", &self.store.len())
            .field("load_latency", &self.load_latency)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryStorage {
    /// Create storage with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl AssetCache for MemoryStorage {
    async fn get(&self, id: &AssetId) -> Option<Asset> {
        self.counters.cache_lookups.fetch_add(1, Ordering::Relaxed);
        self.cache.get(id).await
    }
}

#[async_trait]
impl AssetLoader for MemoryStorage {
    async fn load(&self, key: &StorageKey) -> HostResult<HostBuffer> {
        self.counters.loads.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = self.load_latency {
            tokio::time::sleep(latency).await;
        }
        self.stored_bytes(key)
            .map(HostBuffer::from)
            .ok_or_else(|| HostError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl AssetRegistry for MemoryStorage {
    async fn create_asset(&self, format: DataFormat, bytes: ImageBytes) -> HostResult<Asset> {
        if bytes.is_empty() {
            return Err(HostError::RegistryRejected("empty asset".to_string()));
        }
        let asset = Asset::from_bytes(format, bytes.clone());
        self.store.insert(asset.storage_key(), bytes);
        self.cache.insert(*asset.id(), asset.clone()).await;
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(asset = %asset.id().short(), format = %asset.format(), "registered asset");
        Ok(asset)
    }

    async fn contains(&self, id: &AssetId) -> bool {
        self.cache.contains_key(id)
    }
}
