//! Video id extraction from pasted links.
//!
//! Known link shapes are tried in a fixed order and the first match wins.
//! If none match, a permissive fallback accepts any string whose last path
//! segment is exactly 11 id characters (ignoring a `?`/`#` suffix). That
//! fallback can fire on unrelated URLs, so matches made by it are tagged
//! `MatchRule::Fallback` for callers to flag as low confidence.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::model::VideoId;

/// Which pattern produced an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// `...?v=<id>` / `...&v=<id>`
    WatchParam,
    /// `youtu.be/<id>`
    ShortLink,
    /// `/shorts/<id>`
    Shorts,
    /// `/embed/<id>`
    Embed,
    /// `/video/<id>`
    VideoPath,
    /// Trailing 11-character path segment; low confidence.
    Fallback,
}

impl MatchRule {
    pub fn is_fallback(self) -> bool {
        self == MatchRule::Fallback
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchRule::WatchParam => "watch_param",
            MatchRule::ShortLink => "short_link",
            MatchRule::Shorts => "shorts",
            MatchRule::Embed => "embed",
            MatchRule::VideoPath => "video_path",
            MatchRule::Fallback => "fallback",
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identifier plus the rule that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub id: VideoId,
    pub rule: MatchRule,
}

static KNOWN_SHAPES: LazyLock<Vec<(MatchRule, Regex)>> = LazyLock::new(|| {
    [
        (MatchRule::WatchParam, r"[?&]v=([A-Za-z0-9_-]{11})"),
        (MatchRule::ShortLink, r"youtu\.be/([A-Za-z0-9_-]{11})"),
        (MatchRule::Shorts, r"/shorts/([A-Za-z0-9_-]{11})"),
        (MatchRule::Embed, r"/embed/([A-Za-z0-9_-]{11})"),
        (MatchRule::VideoPath, r"/video/([A-Za-z0-9_-]{11})"),
    ]
    .into_iter()
    .filter_map(|(rule, pattern)| Regex::new(pattern).ok().map(|re| (rule, re)))
    .collect()
});

static TRAILING_SEGMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/([A-Za-z0-9_-]{11})(?:[?#].*)?$").ok());

/// Extract the video id from one input line, or `None`.
pub fn extract(raw: &str) -> Option<VideoId> {
    extract_with_rule(raw).map(|e| e.id)
}

/// Like [`extract`] but also reports which rule matched.
pub fn extract_with_rule(raw: &str) -> Option<Extraction> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for (rule, re) in KNOWN_SHAPES.iter() {
        if let Some(id) = capture_id(re, s) {
            return Some(Extraction { id, rule: *rule });
        }
    }

    let re = TRAILING_SEGMENT.as_ref()?;
    capture_id(re, s).map(|id| Extraction {
        id,
        rule: MatchRule::Fallback,
    })
}

fn capture_id(re: &Regex, s: &str) -> Option<VideoId> {
    re.captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| VideoId::parse(m.as_str()))
}
