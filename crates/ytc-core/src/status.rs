//! Classify oEmbed HTTP status codes.

/// Coarse meaning of a non-2xx status from the oEmbed endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// 400/404: the video does not exist or the URL was rejected.
    Unavailable,
    /// 401/403: private, age-gated, or embedding disabled.
    Restricted,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Other 5xx.
    ServerError,
    Other,
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> StatusKind {
    match code {
        400 | 404 => StatusKind::Unavailable,
        401 | 403 => StatusKind::Restricted,
        429 | 503 => StatusKind::Throttled,
        500..=599 => StatusKind::ServerError,
        _ => StatusKind::Other,
    }
}
