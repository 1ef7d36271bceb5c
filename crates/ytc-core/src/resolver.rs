//! Resolver: turn an extracted video id into a channel record.
//!
//! Cache first, then one network fetch. Failures come back as values
//! (`Err(ResolveError)` inside [`Resolved`]) and are never cached, so the
//! next run retries them.

use std::time::Duration;

use crate::cache::ResolutionCache;
use crate::fetch::MetadataFetcher;
use crate::model::{Resolution, ResolveError, Source, VideoId};

/// Outcome of one lookup plus where it came from.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub outcome: Resolution,
    pub source: Source,
}

/// Cache-fronted oEmbed lookup.
pub struct Resolver {
    cache: Box<dyn ResolutionCache>,
    fetcher: Box<dyn MetadataFetcher>,
    ttl: Duration,
}

impl Resolver {
    pub fn new(
        cache: Box<dyn ResolutionCache>,
        fetcher: Box<dyn MetadataFetcher>,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            fetcher,
            ttl,
        }
    }

    /// Resolve an optional id. Never fails; errors are part of the outcome.
    pub async fn resolve(&self, id: Option<&VideoId>) -> Resolved {
        let Some(id) = id else {
            return Resolved {
                outcome: Err(ResolveError::InvalidId),
                source: Source::Skipped,
            };
        };

        match self.cache.get(id).await {
            Ok(Some(record)) => {
                tracing::debug!(video_id = %id, source = "cache", "resolved");
                return Resolved {
                    outcome: Ok(record),
                    source: Source::Cache,
                };
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(video_id = %id, "cache read failed, treating as miss: {:#}", e)
            }
        }

        let outcome = self.fetcher.fetch(id).await.map(|p| p.into_record());
        match &outcome {
            Ok(record) => {
                if let Err(e) = self.cache.put(id, record, self.ttl).await {
                    tracing::warn!(video_id = %id, "cache write failed: {:#}", e);
                }
                tracing::debug!(video_id = %id, source = "network", "resolved");
            }
            Err(e) => tracing::info!(video_id = %id, "lookup failed: {}", e),
        }

        Resolved {
            outcome,
            source: Source::Network,
        }
    }
}
