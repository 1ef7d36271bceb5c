use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Public oEmbed endpoint used when the config does not override it.
pub const DEFAULT_OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

/// How the oEmbed request reaches the endpoint and what shape the reply has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// Request the oEmbed URL itself; body is the oEmbed JSON.
    #[default]
    Direct,
    /// `<prefix><encoded oEmbed URL>`; the relay forwards the body unchanged.
    Passthrough,
    /// `<prefix><encoded oEmbed URL>`; the body is
    /// `{"contents": "<json string>", "status": {...}}`.
    Wrapped,
}

impl RelayMode {
    /// Prefix used when `relay.prefix` is not set.
    pub fn default_prefix(self) -> &'static str {
        match self {
            RelayMode::Direct => "",
            RelayMode::Passthrough => "https://corsproxy.io/?",
            RelayMode::Wrapped => "https://api.allorigins.win/get?url=",
        }
    }
}

/// Relay section (`[relay]` in config.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub mode: RelayMode,
    /// URL prefix the percent-encoded oEmbed URL is appended to. Ignored in direct mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl RelayConfig {
    pub fn effective_prefix(&self) -> &str {
        self.prefix
            .as_deref()
            .unwrap_or_else(|| self.mode.default_prefix())
    }
}

/// Throttle strategy between consecutive lookups in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleMode {
    /// Sleep `delay_ms` after every item except the last.
    #[default]
    Fixed,
    /// Token bucket: `requests_per_second` sustained, `burst` max.
    TokenBucket,
}

/// Throttle section (`[throttle]` in config.toml). Omitted keys take defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub mode: ThrottleMode,
    pub delay_ms: u64,
    pub requests_per_second: u32,
    pub burst: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            mode: ThrottleMode::Fixed,
            delay_ms: 500,
            requests_per_second: 2,
            burst: 1,
        }
    }
}

/// Clipboard helper override (`[clipboard]`). When absent the CLI searches PATH.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Global configuration loaded from `~/.config/ytc/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YtcConfig {
    /// oEmbed endpoint; `?format=json&url=...` is appended.
    pub oembed_endpoint: String,
    /// How long a successful lookup stays fresh in the cache.
    pub cache_ttl_secs: u64,
    /// libcurl connect timeout.
    pub connect_timeout_secs: u64,
    /// libcurl total request timeout.
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clipboard: Option<ClipboardConfig>,
}

impl Default for YtcConfig {
    fn default() -> Self {
        Self {
            oembed_endpoint: DEFAULT_OEMBED_ENDPOINT.to_string(),
            cache_ttl_secs: 6 * 60 * 60,
            connect_timeout_secs: 15,
            request_timeout_secs: 30,
            relay: RelayConfig::default(),
            throttle: ThrottleConfig::default(),
            clipboard: None,
        }
    }
}

impl YtcConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ytc")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<YtcConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = YtcConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: YtcConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
