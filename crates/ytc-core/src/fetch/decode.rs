//! Decode the response body according to the relay shape.

use serde::Deserialize;

use crate::config::RelayMode;
use crate::model::{ChannelRecord, ResolveError};

/// The subset of the oEmbed payload we use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OEmbedPayload {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_url: Option<String>,
}

impl OEmbedPayload {
    pub fn into_record(self) -> ChannelRecord {
        ChannelRecord::new(self.author_name, self.author_url)
    }
}

/// Envelope returned by "wrapped" relays (allorigins-style `get?url=`).
#[derive(Debug, Deserialize)]
struct WrappedEnvelope {
    #[serde(default)]
    contents: Option<String>,
    #[serde(default)]
    status: Option<WrappedStatus>,
}

#[derive(Debug, Deserialize)]
struct WrappedStatus {
    #[serde(default)]
    http_code: Option<u32>,
}

/// Decode a 2xx body into the oEmbed payload. For the wrapped shape the upstream
/// `status.http_code` wins over the contents: a non-2xx code is `Http(code)`.
pub fn decode_body(mode: RelayMode, body: &[u8]) -> Result<OEmbedPayload, ResolveError> {
    match mode {
        RelayMode::Direct | RelayMode::Passthrough => parse_payload(body),
        RelayMode::Wrapped => {
            let envelope: WrappedEnvelope = serde_json::from_slice(body)
                .map_err(|e| ResolveError::Relay(format!("envelope: {e}")))?;
            if let Some(code) = envelope.status.and_then(|s| s.http_code) {
                if !(200..300).contains(&code) {
                    return Err(ResolveError::Http(code));
                }
            }
            let contents = envelope
                .contents
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| ResolveError::Relay("envelope has no contents".to_string()))?;
            parse_payload(contents.as_bytes())
        }
    }
}

fn parse_payload(body: &[u8]) -> Result<OEmbedPayload, ResolveError> {
    serde_json::from_slice(body).map_err(|e| ResolveError::Decode(e.to_string()))
}
