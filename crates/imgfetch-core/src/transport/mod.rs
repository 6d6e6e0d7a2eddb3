//! Blocking HTTP transport over libcurl.
//!
//! One `Easy` handle per request. HEAD requests never read a body. Everything
//! a request allocates (handle, header list, buffers) is owned here and
//! released on every return path.

mod parse;

pub use parse::content_length;

use crate::config::TransportConfig;
use http::HeaderMap;
use parse::HeaderBlock;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Transport limits applied to each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub connect_timeout: Option<Duration>,
    pub timeout: Option<Duration>,
    pub follow_redirects: bool,
    pub max_redirections: u32,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::from(&TransportConfig::default())
    }
}

impl From<&TransportConfig> for TransportOptions {
    fn from(cfg: &TransportConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout_secs.map(Duration::from_secs),
            timeout: cfg.timeout_secs.map(Duration::from_secs),
            follow_redirects: cfg.follow_redirects,
            max_redirections: cfg.max_redirections,
        }
    }
}

/// Methods the fetcher issues upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundMethod {
    /// Size probe; no body is read.
    Head,
    Get,
}

impl fmt::Display for OutboundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutboundMethod::Head => "HEAD",
            OutboundMethod::Get => "GET",
        })
    }
}

/// A HEAD or GET to send upstream.
#[derive(Debug, Clone, Copy)]
pub struct OutboundRequest<'a> {
    pub method: OutboundMethod,
    pub url: &'a Url,
    pub headers: &'a HeaderMap,
}

/// Response of the final hop.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: u32,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Set when the transfer failed after the response headers arrived
    /// (e.g. the connection closed mid-body). `body` then holds what was read.
    pub body_error: Option<curl::Error>,
}

/// Performs `request` and collects the final response.
///
/// Returns `Err` when the transfer failed before a complete final header
/// block was received (connect, DNS, TLS, timeout, redirect loop).
pub fn send(
    request: OutboundRequest<'_>,
    options: &TransportOptions,
) -> Result<UpstreamResponse, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(request.url.as_str())?;
    match request.method {
        OutboundMethod::Head => easy.nobody(true)?,
        OutboundMethod::Get => easy.get(true)?,
    }
    easy.follow_location(options.follow_redirects)?;
    if options.follow_redirects {
        easy.max_redirections(options.max_redirections)?;
    }
    if let Some(t) = options.connect_timeout {
        easy.connect_timeout(t)?;
    }
    if let Some(t) = options.timeout {
        easy.timeout(t)?;
    }

    let mut list = curl::easy::List::new();
    for (name, value) in request.headers {
        match value.to_str() {
            Ok(v) => list.append(&format!("{}: {}", name, v))?,
            Err(_) => tracing::debug!(header = %name, "skipping non-ASCII outbound header"),
        }
    }
    easy.http_headers(list)?;

    let mut block = HeaderBlock::default();
    let mut body = Vec::new();
    let outcome = {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            block.push_line(line);
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()
    };

    let body_error = match outcome {
        Ok(()) => None,
        Err(e) if block.is_final(options.follow_redirects) => Some(e),
        Err(e) => return Err(e),
    };

    let status = easy.response_code()?;
    Ok(UpstreamResponse {
        status,
        headers: block.headers,
        body,
        body_error,
    })
}
