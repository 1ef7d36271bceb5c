//! `ytc config path|show`.

use anyhow::{Context, Result};
use ytc_core::config;

pub fn run_config_path() -> Result<()> {
    println!("{}", config::config_path()?.display());
    Ok(())
}

pub fn run_config_show() -> Result<()> {
    let cfg = config::load_or_init()?;
    let text = toml::to_string_pretty(&cfg).context("serialize config")?;
    print!("{text}");
    Ok(())
}
