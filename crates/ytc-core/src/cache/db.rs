//! SQLite-backed resolution cache.
//!
//! Handles connection, migrations, and the key/value rows. The value column
//! holds the serialized [`CacheEntry`] JSON; `expiry` is duplicated into its
//! own column only so `stats` can count fresh rows without decoding.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{cache_key, now_millis, CacheEntry, ResolutionCache};
use crate::model::{ChannelRecord, VideoId};

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't
/// break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Row counts reported by `ytc cache stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total: i64,
    pub fresh: i64,
}

impl CacheStats {
    pub fn stale(&self) -> i64 {
        self.total - self.fresh
    }
}

/// Handle to the SQLite cache database.
///
/// The database file is stored under the XDG state directory:
/// `~/.local/state/ytc/cache.db` on Debian.
#[derive(Clone)]
pub struct CacheDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl CacheDb {
    /// Default location of the cache file.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("ytc")?;
        Ok(xdg_dirs.get_state_home().join("ytc").join("cache.db"))
    }

    /// Open (or create) the default cache database and run migrations.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(Self::default_path()?).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await
            .with_context(|| format!("open cache db: {}", path.display()))?;
        let db = CacheDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS oembed_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expiry INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Raw entry for `id`, ignoring expiry. `None` if absent or undecodable.
    pub async fn entry(&self, id: &VideoId) -> Result<Option<CacheEntry>> {
        let key = cache_key(id);
        let row = sqlx::query(
            r#"
            SELECT value
            FROM oembed_cache
            WHERE key = ?1
            "#,
        )
        .bind(&key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value: String = row.get("value");
        match serde_json::from_str::<CacheEntry>(&value) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(key = %key, "ignoring undecodable cache row: {}", e);
                Ok(None)
            }
        }
    }

    /// Insert or replace the entry for `id`.
    pub async fn upsert_entry(&self, id: &VideoId, entry: &CacheEntry) -> Result<()> {
        let value = serde_json::to_string(entry)?;
        sqlx::query(
            r#"
            INSERT INTO oembed_cache (key, value, expiry, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expiry = excluded.expiry,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(cache_key(id))
        .bind(value)
        .bind(entry.expiry)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Count total and still-fresh rows.
    pub async fn stats(&self) -> Result<CacheStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(CASE WHEN expiry > ?1 THEN 1 ELSE 0 END), 0) AS fresh
            FROM oembed_cache
            "#,
        )
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(CacheStats {
            total: row.get("total"),
            fresh: row.get("fresh"),
        })
    }
}

#[async_trait]
impl ResolutionCache for CacheDb {
    async fn get(&self, id: &VideoId) -> Result<Option<ChannelRecord>> {
        let now = now_millis();
        Ok(self
            .entry(id)
            .await?
            .filter(|e| e.is_fresh_at(now))
            .map(|e| e.data))
    }

    async fn put(&self, id: &VideoId, record: &ChannelRecord, ttl: Duration) -> Result<()> {
        self.upsert_entry(id, &CacheEntry::new(record.clone(), ttl))
            .await
    }
}

#[cfg(test)]
/// Open an in-memory database for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<CacheDb> {
    // Single connection to avoid in-memory pool handing back a different empty DB.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = CacheDb { pool };
    db.migrate().await?;
    Ok(db)
}
