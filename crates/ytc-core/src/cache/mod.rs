//! Resolution cache: video id -> channel record, with a soft expiry.
//!
//! Entries are written only after a successful network lookup and are
//! checked for staleness on read. Nothing is evicted; stale rows stay until
//! overwritten by the next successful lookup.

mod db;
mod memory;

pub use db::{CacheDb, CacheStats};
pub use memory::MemoryCache;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::model::{ChannelRecord, VideoId};

/// Storage key prefix; the full key is `yt_oembed_<id>`.
pub const KEY_PREFIX: &str = "yt_oembed_";

/// Storage key for an id.
pub fn cache_key(id: &VideoId) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Persisted value: `{"data": {"name", "url"}, "expiry": <epoch millis>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: ChannelRecord,
    pub expiry: i64,
}

impl CacheEntry {
    pub fn new(data: ChannelRecord, ttl: Duration) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            data,
            expiry: now_millis().saturating_add(ttl_ms),
        }
    }

    /// Fresh while `now < expiry`.
    pub fn is_fresh_at(&self, now_ms: i64) -> bool {
        now_ms < self.expiry
    }
}

/// Key/value store consulted before any network lookup.
#[async_trait]
pub trait ResolutionCache: Send + Sync {
    /// Fresh record for `id`, or `None` if absent or stale.
    async fn get(&self, id: &VideoId) -> Result<Option<ChannelRecord>>;

    /// Store `record` for `id`, replacing any entry, with expiry `now + ttl`.
    async fn put(&self, id: &VideoId, record: &ChannelRecord, ttl: Duration) -> Result<()>;
}

/// Current time as Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    i64::try_from(ms).unwrap_or(i64::MAX)
}
