//! CLI for ytc.

mod clipboard;
mod commands;
mod input;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ytc_core::config;

use commands::{run_cache_stats, run_config_path, run_config_show, run_extract, run_resolve};
pub use render::OutputFormat;

/// Top-level CLI for ytc.
#[derive(Debug, Parser)]
#[command(name = "ytc")]
#[command(about = "ytc: resolve video links to channel names and URLs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve each input line to its channel name and channel URL.
    Resolve {
        /// File with one link per line. `-` reads stdin; omitted reads stdin unless --url is given.
        file: Option<PathBuf>,

        /// Link to resolve; repeatable. Processed after the lines of FILE.
        #[arg(long = "url", value_name = "URL")]
        urls: Vec<String>,

        /// Copy the resolved channel URLs to the clipboard when done.
        #[arg(long)]
        copy: bool,

        /// Output format for result rows.
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Fixed pause between lookups for this run, overriding [throttle].
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,

        /// Use a throwaway in-memory cache instead of the on-disk one.
        #[arg(long)]
        no_cache: bool,
    },

    /// Print the video id and matching rule for each line (no network).
    Extract {
        /// File with one link per line. `-` reads stdin.
        file: Option<PathBuf>,

        /// Link to inspect; repeatable.
        #[arg(long = "url", value_name = "URL")]
        urls: Vec<String>,
    },

    /// Inspect the lookup cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show total, fresh and stale entry counts.
    Stats,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file path.
    Path,
    /// Print the effective configuration as TOML.
    Show,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Resolve {
                file,
                urls,
                copy,
                format,
                delay_ms,
                no_cache,
            } => {
                let mut cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                if let Some(ms) = delay_ms {
                    cfg.throttle.mode = config::ThrottleMode::Fixed;
                    cfg.throttle.delay_ms = ms;
                }
                let lines = input::collect_lines(file.as_deref(), &urls)?;
                run_resolve(&cfg, &lines, format, copy, no_cache).await?;
            }
            CliCommand::Extract { file, urls } => {
                let lines = input::collect_lines(file.as_deref(), &urls)?;
                run_extract(&lines)?;
            }
            CliCommand::Cache {
                action: CacheAction::Stats,
            } => run_cache_stats().await?,
            CliCommand::Config {
                action: ConfigAction::Path,
            } => run_config_path()?,
            CliCommand::Config {
                action: ConfigAction::Show,
            } => run_config_show()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
