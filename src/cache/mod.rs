use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::terrain::TerrainTile;

/// One-degree SRTM cell, keyed by its south-west corner.
#[derive(Hash, PartialEq, Eq, Clone, Copy, Debug)]
pub struct TileKey {
    pub lat: i32,
    pub lon: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Shared LRU of decoded terrain tiles.
///
/// Lookups take the read lock and `peek`, so concurrent readers never serialize
/// on each other. Recency is only refreshed on insert, which makes eviction
/// closer to FIFO under heavy read load. Two threads missing on the same tile
/// will both load it; the second insert simply replaces the first.
pub struct TileCache {
    cache: RwLock<LruCache<TileKey, Arc<TerrainTile>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TileCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &TileKey) -> Option<Arc<TerrainTile>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        let tile = cache.peek(key).cloned();
        match tile {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        tile
    }

    pub fn insert(&self, key: TileKey, tile: Arc<TerrainTile>) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.put(key, tile);
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
