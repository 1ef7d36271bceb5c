//! oEmbed metadata fetch.
//!
//! Uses the curl crate (libcurl) to GET the oEmbed document for a video,
//! either directly or through a relay, and decodes the body according to
//! the configured relay shape. One request per call; no retries.

mod decode;
mod request;

pub use crate::status::{classify_http_status, StatusKind};
pub use decode::{decode_body, OEmbedPayload};
pub use request::{oembed_url, request_url};

use async_trait::async_trait;
use std::time::Duration;

use crate::config::{RelayConfig, YtcConfig};
use crate::model::{ResolveError, VideoId};

/// Source of oEmbed payloads. The resolver only depends on this trait.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, id: &VideoId) -> Result<OEmbedPayload, ResolveError>;
}

/// Status code and body of a completed GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

/// Options for [`CurlFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub endpoint: String,
    pub relay: RelayConfig,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

impl FetchOptions {
    pub fn from_config(cfg: &YtcConfig) -> Self {
        Self {
            endpoint: cfg.oembed_endpoint.clone(),
            relay: cfg.relay.clone(),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.request_timeout_secs),
            user_agent: format!("ytc/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// libcurl-backed fetcher. Each call runs one blocking GET in `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    opts: FetchOptions,
}

impl CurlFetcher {
    pub fn new(opts: FetchOptions) -> Self {
        Self { opts }
    }

    pub fn from_config(cfg: &YtcConfig) -> Self {
        Self::new(FetchOptions::from_config(cfg))
    }
}

#[async_trait]
impl MetadataFetcher for CurlFetcher {
    async fn fetch(&self, id: &VideoId) -> Result<OEmbedPayload, ResolveError> {
        let url = request_url(&self.opts.endpoint, &self.opts.relay, id);
        tracing::debug!(video_id = %id, relay = ?self.opts.relay.mode, "oEmbed GET {}", url);

        let opts = self.opts.clone();
        let response = tokio::task::spawn_blocking(move || http_get(&url, &opts))
            .await
            .map_err(|e| ResolveError::Network(format!("fetch task join: {e}")))?
            .map_err(|e| ResolveError::Network(e.to_string()))?;

        if !(200..300).contains(&response.status) {
            let kind = classify_http_status(response.status);
            tracing::warn!(
                video_id = %id,
                status = response.status,
                ?kind,
                "oEmbed request failed"
            );
            return Err(ResolveError::Http(response.status));
        }

        decode_body(self.opts.relay.mode, &response.body).inspect_err(|e| {
            tracing::warn!(video_id = %id, "oEmbed response unusable: {}", e);
        })
    }
}

/// Performs a GET and returns status + body. Follows redirects.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn http_get(url: &str, opts: &FetchOptions) -> Result<HttpResponse, curl::Error> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(5)?;
    easy.useragent(&opts.user_agent)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;

    let mut list = curl::easy::List::new();
    list.append("Accept: application/json")?;
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    Ok(HttpResponse { status, body })
}
