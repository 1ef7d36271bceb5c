//! Process-local cache (ephemeral runs, tests).

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use super::{cache_key, now_millis, CacheEntry, ResolutionCache};
use crate::model::{ChannelRecord, VideoId};

/// In-memory map with the same expiry semantics as [`super::CacheDb`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw entry for `id`, ignoring expiry.
    pub fn entry(&self, id: &VideoId) -> Option<CacheEntry> {
        self.entries
            .read()
            .ok()
            .and_then(|m| m.get(&cache_key(id)).cloned())
    }

    /// Insert a raw entry (e.g. one with an expiry in the past).
    pub fn insert_entry(&self, id: &VideoId, entry: CacheEntry) {
        if let Ok(mut m) = self.entries.write() {
            m.insert(cache_key(id), entry);
        }
    }
}

#[async_trait]
impl ResolutionCache for MemoryCache {
    async fn get(&self, id: &VideoId) -> Result<Option<ChannelRecord>> {
        let now = now_millis();
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        Ok(entries
            .get(&cache_key(id))
            .filter(|e| e.is_fresh_at(now))
            .map(|e| e.data.clone()))
    }

    async fn put(&self, id: &VideoId, record: &ChannelRecord, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(record.clone(), ttl);
        self.entries
            .write()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?
            .insert(cache_key(id), entry);
        Ok(())
    }
}
