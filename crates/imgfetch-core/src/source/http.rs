//! Remote image source: fetches the image named by the `url` query parameter.
//!
//! Enforces the origin allow-list, probes `Content-Length` with a HEAD when a
//! size limit is configured, downloads with a GET, and forwards only
//! cache-control response headers.

use std::sync::Arc;

use ::http::{HeaderMap, Request};
use url::Url;

use super::{FetchedImage, ImageSource};
use crate::cache_headers::filter_cache_headers;
use crate::config::SourceConfig;
use crate::error::{ConfigError, FetchError};
use crate::origin::{authority, AllowedOrigins};
use crate::request::{self, HeaderPolicy};
use crate::transport::{
    self, content_length, OutboundMethod, OutboundRequest, TransportOptions,
};

/// Fetches images over HTTP(S). Immutable after construction and safe to share across threads.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    config: Arc<SourceConfig>,
    origins: AllowedOrigins,
    header_policy: HeaderPolicy,
    transport: TransportOptions,
}

impl HttpImageSource {
    pub fn new(config: Arc<SourceConfig>) -> Result<Self, ConfigError> {
        let origins = AllowedOrigins::from_config(&config.allowed_origins)?;
        let header_policy = HeaderPolicy::from_config(&config)?;
        let transport = TransportOptions::from(&config.transport);
        if origins.is_unrestricted() {
            tracing::debug!("http source: no allowed origins configured, any origin may be fetched");
        }
        Ok(Self {
            config,
            origins,
            header_policy,
            transport,
        })
    }

    /// Registry constructor.
    pub fn factory(config: Arc<SourceConfig>) -> Result<Box<dyn ImageSource>, ConfigError> {
        Ok(Box::new(Self::new(config)?))
    }

    fn fetch_image(&self, url: &Url, inbound: &Request<()>) -> Result<FetchedImage, FetchError> {
        let headers = self.header_policy.outbound_headers(inbound);

        if self.config.has_size_limit() {
            self.check_remote_size(url, &headers)?;
        }

        let res = self
            .send(OutboundMethod::Get, url, &headers)
            .map_err(|source| FetchError::GetRequest {
                url: url.to_string(),
                source,
            })?;
        if res.status != 200 {
            return Err(FetchError::UpstreamStatus {
                status: res.status,
                url: url.to_string(),
            });
        }

        let cache_headers = filter_cache_headers(&res.headers);

        if let Some(source) = res.body_error {
            return Err(FetchError::BodyRead {
                url: url.to_string(),
                source,
            });
        }
        tracing::debug!(url = %url, bytes = res.body.len(), "fetched remote image");
        Ok(FetchedImage {
            body: res.body,
            headers: cache_headers,
        })
    }

    /// HEAD probe rejecting images whose declared size exceeds the limit.
    fn check_remote_size(&self, url: &Url, headers: &HeaderMap) -> Result<(), FetchError> {
        let res = self
            .send(OutboundMethod::Head, url, headers)
            .map_err(|source| FetchError::HeadRequest {
                url: url.to_string(),
                source,
            })?;

        if head_status_rejected(res.status) {
            return Err(FetchError::HeadStatus {
                status: res.status,
                url: url.to_string(),
            });
        }

        let declared = content_length(&res.headers);
        let limit = self.config.max_allowed_size;
        tracing::debug!(url = %url, status = res.status, declared, limit, "probed remote image size");
        if declared > limit {
            tracing::warn!(url = %url, declared, limit, "remote image exceeds size limit");
            return Err(FetchError::PayloadTooLarge { declared, limit });
        }
        Ok(())
    }

    fn send(
        &self,
        method: OutboundMethod,
        url: &Url,
        headers: &HeaderMap,
    ) -> Result<transport::UpstreamResponse, curl::Error> {
        tracing::debug!(
            %method,
            url = %url,
            authorization = headers.contains_key(::http::header::AUTHORIZATION),
            "outbound request"
        );
        transport::send(
            OutboundRequest {
                method,
                url,
                headers,
            },
            &self.transport,
        )
    }
}

/// Status check applied to the HEAD probe.
///
/// Kept exactly as deployed: a status cannot be both below 200 and above 206,
/// so this never rejects and a non-2xx HEAD only fails through `Content-Length`.
#[allow(clippy::impossible_comparisons)]
fn head_status_rejected(status: u32) -> bool {
    status < 200 && status > 206
}

impl ImageSource for HttpImageSource {
    fn matches(&self, req: &Request<()>) -> bool {
        request::matches_url_query(req)
    }

    fn get_image_with_cache_headers(&self, req: &Request<()>) -> Result<FetchedImage, FetchError> {
        let url = request::target_url(req)?;
        let raw = request::query_param(req, request::URL_PARAM).unwrap_or_default();
        if !self.origins.permits(&raw) {
            let host = authority(&raw).unwrap_or_default();
            tracing::warn!(host = %host, "remote URL origin not allowed");
            return Err(FetchError::OriginNotAllowed { host });
        }
        self.fetch_image(&url, req)
    }
}
