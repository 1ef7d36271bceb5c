//! CLI command handlers, one file per command.

mod cache;
mod config;
mod extract;
mod resolve;

pub use cache::run_cache_stats;
pub use config::{run_config_path, run_config_show};
pub use extract::run_extract;
pub use resolve::run_resolve;
