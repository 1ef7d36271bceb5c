//! `ytc resolve` – run a batch and render rows as they arrive.

use anyhow::{Context, Result};
use std::io::{self, IsTerminal};
use ytc_core::batch::BatchDriver;
use ytc_core::cache::{CacheDb, MemoryCache, ResolutionCache};
use ytc_core::config::YtcConfig;
use ytc_core::export::{export_to_clipboard, ExportOutcome};
use ytc_core::fetch::CurlFetcher;
use ytc_core::resolver::Resolver;
use ytc_core::throttle;

use crate::cli::clipboard::CommandClipboard;
use crate::cli::render::{OutputFormat, TerminalSink};

pub async fn run_resolve(
    cfg: &YtcConfig,
    lines: &[String],
    format: OutputFormat,
    copy: bool,
    no_cache: bool,
) -> Result<()> {
    let cache: Box<dyn ResolutionCache> = if no_cache {
        Box::new(MemoryCache::new())
    } else {
        Box::new(
            CacheDb::open_default()
                .await
                .context("open cache database")?,
        )
    };
    let resolver = Resolver::new(
        cache,
        Box::new(CurlFetcher::from_config(cfg)),
        cfg.cache_ttl(),
    );
    let driver = BatchDriver::new(resolver, throttle::from_config(&cfg.throttle));

    let live = io::stderr().is_terminal();
    let mut sink = TerminalSink::new(io::stdout(), io::stderr(), format, live);
    let report = driver.run(lines, &mut sink).await?;

    if !report.rows.is_empty() {
        let mut summary = format!(
            "{} resolved, {} failed, {} from cache",
            report.resolved(),
            report.failed(),
            report.cache_hits()
        );
        if report.fallback() > 0 {
            summary.push_str(&format!(", {} low-confidence match(es)", report.fallback()));
        }
        eprintln!("{summary}");
    }

    if copy {
        let mut clipboard = CommandClipboard::new(cfg.clipboard.clone());
        match export_to_clipboard(&report.rows, &mut clipboard)? {
            ExportOutcome::NothingToCopy => eprintln!("No valid channel URLs found to copy."),
            ExportOutcome::Copied { count } => eprintln!("Copied! ({count} URLs)"),
        }
    }

    Ok(())
}
