//! Error types for image fetching and source construction.

use http::StatusCode;
use thiserror::Error;

/// Failure kinds an outer layer branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// `url` parameter missing or not an absolute http(s) URL.
    InvalidImageUrl,
    /// Target host not in a non-empty allow-list.
    OriginNotAllowed,
    /// Transport failure or non-success status on HEAD or GET.
    UpstreamFetch,
    /// Declared `Content-Length` exceeds the configured maximum.
    PayloadTooLarge,
    /// Response body could not be read after a successful status.
    BodyRead,
}

/// Error returned by a single fetch. Every call is independent; none of these is fatal.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid image URL: {reason}")]
    InvalidImageUrl { reason: String },

    #[error("not allowed remote URL origin: {host}")]
    OriginNotAllowed { host: String },

    #[error("error fetching image http headers (url={url}): {source}")]
    HeadRequest {
        url: String,
        #[source]
        source: curl::Error,
    },

    /// Reserved for a rejected probe status; the current status check never fires.
    #[error("error fetching image http headers: (status={status}) (url={url})")]
    HeadStatus { status: u32, url: String },

    #[error("error downloading image (url={url}): {source}")]
    GetRequest {
        url: String,
        #[source]
        source: curl::Error,
    },

    #[error("error downloading image: (status={status}) (url={url})")]
    UpstreamStatus { status: u32, url: String },

    #[error("Content-Length {declared} exceeds maximum allowed {limit} bytes")]
    PayloadTooLarge { declared: i64, limit: i64 },

    #[error("unable to read image response body (url={url}): {source}")]
    BodyRead {
        url: String,
        #[source]
        source: curl::Error,
    },
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidImageUrl { .. } => ErrorKind::InvalidImageUrl,
            FetchError::OriginNotAllowed { .. } => ErrorKind::OriginNotAllowed,
            FetchError::HeadRequest { .. }
            | FetchError::HeadStatus { .. }
            | FetchError::GetRequest { .. }
            | FetchError::UpstreamStatus { .. } => ErrorKind::UpstreamFetch,
            FetchError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            FetchError::BodyRead { .. } => ErrorKind::BodyRead,
        }
    }

    /// Status an HTTP front end should answer with for this failure.
    /// Upstream 4xx statuses are passed through; anything else upstream is a bad gateway.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FetchError::InvalidImageUrl { .. } => StatusCode::BAD_REQUEST,
            FetchError::OriginNotAllowed { .. } => StatusCode::FORBIDDEN,
            FetchError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            FetchError::HeadStatus { status, .. } | FetchError::UpstreamStatus { status, .. } => {
                u16::try_from(*status)
                    .ok()
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(StatusCode::is_client_error)
                    .unwrap_or(StatusCode::BAD_GATEWAY)
            }
            FetchError::HeadRequest { .. }
            | FetchError::GetRequest { .. }
            | FetchError::BodyRead { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Upstream HTTP status, when the failure carries one.
    pub fn upstream_status(&self) -> Option<u32> {
        match self {
            FetchError::HeadStatus { status, .. } | FetchError::UpstreamStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Error building a source from its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid allowed origin {origin:?}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("invalid authorization credential: {reason}")]
    InvalidAuthorization { reason: String },
}
