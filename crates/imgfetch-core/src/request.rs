//! Inbound request helpers: target URL extraction and outbound header rules.

use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use http::{Method, Request};
use url::Url;

use crate::config::SourceConfig;
use crate::error::{ConfigError, FetchError};

/// Query parameter carrying the remote image URL.
pub const URL_PARAM: &str = "url";

/// Inbound header whose value is relayed upstream as `Authorization`.
pub const X_FORWARD_AUTHORIZATION: HeaderName =
    HeaderName::from_static("x-forward-authorization");

/// First value of query parameter `name`, percent-decoded.
pub fn query_param<B>(req: &Request<B>, name: &str) -> Option<String> {
    let query = req.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Routing predicate: a GET carrying a non-empty `url` parameter.
pub fn matches_url_query<B>(req: &Request<B>) -> bool {
    req.method() == Method::GET
        && query_param(req, URL_PARAM).is_some_and(|u| !u.is_empty())
}

/// Parse the `url` parameter as an absolute http(s) URL.
pub fn target_url<B>(req: &Request<B>) -> Result<Url, FetchError> {
    let raw = query_param(req, URL_PARAM)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| FetchError::InvalidImageUrl {
            reason: "missing url query parameter".to_string(),
        })?;
    let url = Url::parse(&raw).map_err(|e| FetchError::InvalidImageUrl {
        reason: format!("{}: {}", e, raw),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidImageUrl {
            reason: format!("unsupported scheme {:?}: {}", other, raw),
        }),
    }
}

/// Which credential, if any, outbound requests carry.
#[derive(Debug, Clone, Default)]
pub struct HeaderPolicy {
    static_authorization: Option<HeaderValue>,
    forward: bool,
}

impl HeaderPolicy {
    pub fn from_config(config: &SourceConfig) -> Result<Self, ConfigError> {
        let static_authorization = if config.authorization.is_empty() {
            None
        } else {
            let mut value = HeaderValue::from_str(&config.authorization).map_err(|_| {
                ConfigError::InvalidAuthorization {
                    reason: "value contains characters not allowed in a header".to_string(),
                }
            })?;
            value.set_sensitive(true);
            Some(value)
        };
        Ok(Self {
            static_authorization,
            forward: config.forwards_authorization(),
        })
    }

    /// Credential for the upstream request: the static one, else the inbound
    /// `X-Forward-Authorization`, else the inbound `Authorization`. Empty values
    /// count as absent. `None` whenever forwarding is disabled and no static
    /// credential is configured.
    pub fn resolve_authorization<B>(&self, req: &Request<B>) -> Option<HeaderValue> {
        if !self.forward {
            return None;
        }
        if let Some(value) = &self.static_authorization {
            return Some(value.clone());
        }
        let inbound = req.headers();
        [&X_FORWARD_AUTHORIZATION, &AUTHORIZATION]
            .into_iter()
            .filter_map(|name| inbound.get(name))
            .find(|value| !value.is_empty())
            .map(|value| {
                let mut value = value.clone();
                value.set_sensitive(true);
                value
            })
    }

    /// Headers for an outbound HEAD or GET. Nothing else from the inbound request is copied.
    pub fn outbound_headers<B>(&self, req: &Request<B>) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(USER_AGENT, HeaderValue::from_static(crate::USER_AGENT));
        if let Some(auth) = self.resolve_authorization(req) {
            headers.insert(AUTHORIZATION, auth);
        }
        headers
    }
}
