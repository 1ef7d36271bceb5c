//! `ytc cache stats` – entry counts for the on-disk cache.

use anyhow::{Context, Result};
use ytc_core::cache::CacheDb;

pub async fn run_cache_stats() -> Result<()> {
    let path = CacheDb::default_path()?;
    let db = CacheDb::open_at(&path)
        .await
        .context("open cache database")?;
    let stats = db.stats().await?;
    println!("path:  {}", path.display());
    println!("total: {}", stats.total);
    println!("fresh: {}", stats.fresh);
    println!("stale: {}", stats.stale());
    Ok(())
}
