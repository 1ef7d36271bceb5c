//! Build the outbound request URL: canonical watch URL -> oEmbed URL -> relay URL.

use url::form_urlencoded;

use crate::config::{RelayConfig, RelayMode};
use crate::model::VideoId;

/// Percent-encode a full URL for use as a single query value.
pub(crate) fn encode_component(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// `<endpoint>?format=json&url=<encoded watch URL>`
pub fn oembed_url(endpoint: &str, id: &VideoId) -> String {
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    format!(
        "{endpoint}{sep}format=json&url={}",
        encode_component(&id.watch_url())
    )
}

/// The URL actually requested, after applying the relay.
pub fn request_url(endpoint: &str, relay: &RelayConfig, id: &VideoId) -> String {
    let target = oembed_url(endpoint, id);
    match relay.mode {
        RelayMode::Direct => target,
        RelayMode::Passthrough | RelayMode::Wrapped => {
            format!("{}{}", relay.effective_prefix(), encode_component(&target))
        }
    }
}
