//! Shared data types: identifiers, channel records, lookup outcomes, result rows.
//!
//! Lookups produce typed outcomes (`Resolution`). The `#N/A` sentinel strings
//! only appear at the presentation boundary (`ResultRow::display_name` /
//! `display_url`) and in serialized records, where a missing field is written
//! as `"#N/A"`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extract::{Extraction, MatchRule};
use crate::status::{classify_http_status, StatusKind};

/// Placeholder for a value that is absent or failed to resolve.
pub const NOT_AVAILABLE: &str = "#N/A";

/// Length of a video identifier.
pub const VIDEO_ID_LEN: usize = 11;

/// An 11-character video identifier over `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Validating constructor.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == VIDEO_ID_LEN && s.bytes().all(is_id_byte);
        valid.then(|| VideoId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this id.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

pub(crate) fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VideoId::parse(&value).ok_or_else(|| format!("invalid video id: {value:?}"))
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

/// Channel attribution for a video. `None` fields were missing upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    #[serde(default, with = "na_sentinel")]
    pub name: Option<String>,
    #[serde(default, with = "na_sentinel")]
    pub url: Option<String>,
}

impl ChannelRecord {
    pub fn new(name: Option<String>, url: Option<String>) -> Self {
        Self {
            name: non_empty(name),
            url: non_empty(url),
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// Serialize `None` as `"#N/A"` and read `"#N/A"`, empty or null back as `None`.
mod na_sentinel {
    use super::NOT_AVAILABLE;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(v.as_deref().unwrap_or(NOT_AVAILABLE))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let v = Option::<String>::deserialize(d)?;
        Ok(v.filter(|s| !s.is_empty() && s != NOT_AVAILABLE))
    }
}

/// Why a line did not resolve to a channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No identifier could be extracted from the input line.
    #[error("no video id in input")]
    InvalidId,
    /// Transport failure (DNS, connect, timeout, TLS).
    #[error("network: {0}")]
    Network(String),
    /// Endpoint (or relay forwarding it) answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Body was not the expected JSON.
    #[error("decode: {0}")]
    Decode(String),
    /// The relay itself failed or returned an unusable envelope.
    #[error("relay: {0}")]
    Relay(String),
}

impl ResolveError {
    /// Placeholder shown in the name column.
    pub fn sentinel(&self) -> String {
        let reason = match self {
            ResolveError::InvalidId => "Invalid ID".to_string(),
            ResolveError::Network(_) => "CORS/Network Error".to_string(),
            ResolveError::Relay(_) => "Relay Error".to_string(),
            ResolveError::Decode(_) => "Bad Response".to_string(),
            ResolveError::Http(code) => match classify_http_status(*code) {
                StatusKind::Unavailable => "Unavailable".to_string(),
                StatusKind::Restricted => "Restricted".to_string(),
                StatusKind::Throttled => "Rate Limited".to_string(),
                StatusKind::ServerError | StatusKind::Other => format!("HTTP {code}"),
            },
        };
        format!("{NOT_AVAILABLE} ({reason})")
    }
}

/// Typed outcome of a lookup.
pub type Resolution = Result<ChannelRecord, ResolveError>;

/// Where a lookup outcome came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Network,
    /// No lookup was attempted (no identifier).
    Skipped,
}

/// One processed input line.
#[derive(Debug, Clone)]
pub struct ResultRow {
    /// 1-based position among the non-blank input lines.
    pub index: usize,
    /// The line as the user wrote it (trimmed).
    pub input: String,
    pub extraction: Option<Extraction>,
    pub outcome: Resolution,
    pub source: Source,
}

impl ResultRow {
    pub fn video_id(&self) -> Option<&VideoId> {
        self.extraction.as_ref().map(|e| &e.id)
    }

    pub fn rule(&self) -> Option<MatchRule> {
        self.extraction.as_ref().map(|e| e.rule)
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn display_name(&self) -> String {
        match &self.outcome {
            Ok(rec) => rec.name.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            Err(e) => e.sentinel(),
        }
    }

    pub fn display_url(&self) -> String {
        match &self.outcome {
            Ok(rec) => rec.url.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            Err(_) => NOT_AVAILABLE.to_string(),
        }
    }
}
