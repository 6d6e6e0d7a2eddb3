//! Origin allow-list.
//!
//! Targets are compared by authority (`host[:port]`) only, using exact string
//! equality. There is no wildcard or subdomain matching, and the scheme of a
//! configured origin is not part of the comparison. A port counts exactly as
//! written: `a:80` and `a` are different authorities.

use std::collections::HashSet;
use url::Url;

use crate::error::ConfigError;

/// `host[:port]` of the absolute URL `raw`, or `None` if it does not parse or
/// has no host.
///
/// The host is taken from the parsed URL. The port is copied from `raw`
/// verbatim, since `url` forgets an explicit default port (`http://a:80`
/// parses to `http://a`).
pub fn authority(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    authority_of(&url, raw)
}

fn authority_of(url: &Url, raw: &str) -> Option<String> {
    let host = url.host_str()?;
    let port = written_port(raw)
        .map(str::to_string)
        .or_else(|| url.port().map(|p| p.to_string()));
    Some(match port {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Port digits spelled out in the authority section of `raw`.
fn written_port(raw: &str) -> Option<&str> {
    let (_, rest) = raw.trim().split_once("://")?;
    let end = rest
        .find(|c: char| matches!(c, '/' | '\\' | '?' | '#'))
        .unwrap_or(rest.len());
    let section = &rest[..end];
    let host_port = section.rsplit_once('@').map_or(section, |(_, hp)| hp);
    let (_, port) = host_port.rsplit_once(':')?;
    (!port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())).then_some(port)
}

/// Set of authorities a fetch target must belong to. Empty means unrestricted.
#[derive(Debug, Clone, Default)]
pub struct AllowedOrigins {
    hosts: HashSet<String>,
}

impl AllowedOrigins {
    /// Parse configured origins. An entry that is not an absolute URL with a
    /// host is rejected rather than skipped, so a mistyped list cannot
    /// collapse into an unrestricted one.
    pub fn from_config<S: AsRef<str>>(origins: &[S]) -> Result<Self, ConfigError> {
        let mut hosts = HashSet::with_capacity(origins.len());
        for origin in origins {
            let origin = origin.as_ref();
            let parsed = Url::parse(origin).map_err(|e| ConfigError::InvalidOrigin {
                origin: origin.to_string(),
                reason: e.to_string(),
            })?;
            let host = authority_of(&parsed, origin).ok_or_else(|| ConfigError::InvalidOrigin {
                origin: origin.to_string(),
                reason: "origin has no host".to_string(),
            })?;
            hosts.insert(host);
        }
        Ok(Self { hosts })
    }

    pub fn is_unrestricted(&self) -> bool {
        self.hosts.is_empty()
    }

    /// True if the URL `raw` may be fetched. Always true for an empty allow-list.
    pub fn permits(&self, raw: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        authority(raw).is_some_and(|host| self.hosts.contains(&host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_keeps_explicit_port() {
        assert_eq!(
            authority("https://img.example.com:8443/a.png").as_deref(),
            Some("img.example.com:8443")
        );
        assert_eq!(
            authority("https://img.example.com/a.png").as_deref(),
            Some("img.example.com")
        );
    }

    #[test]
    fn authority_keeps_written_default_port() {
        assert_eq!(
            authority("http://img.example.com:80/a.png").as_deref(),
            Some("img.example.com:80")
        );
        assert_eq!(
            authority("https://user:pw@img.example.com:443/a:1.png").as_deref(),
            Some("img.example.com:443")
        );
    }

    #[test]
    fn backslash_ends_the_authority() {
        // `url` reads `\` as a path separator in http URLs, so the host is a.example.com.
        assert_eq!(
            authority("http://a.example.com\\@b.example.com/x.png").as_deref(),
            Some("a.example.com")
        );
    }

    #[test]
    fn default_port_is_not_implied() {
        let origins = AllowedOrigins::from_config(&["http://cdn.example.com:80"]).unwrap();
        assert!(!origins.permits("https://cdn.example.com/a.png"));
        assert!(!origins.permits("http://cdn.example.com/a.png"));
        assert!(origins.permits("http://cdn.example.com:80/a.png"));
    }

    #[test]
    fn written_port_matches_across_schemes() {
        let origins = AllowedOrigins::from_config(&["https://img.example.com:443"]).unwrap();
        assert!(origins.permits("http://img.example.com:443/a.png"));
        assert!(!origins.permits("https://img.example.com/a.png"));
    }

    #[test]
    fn authority_ipv6_keeps_brackets() {
        assert_eq!(
            authority("http://[::1]:8080/a.png").as_deref(),
            Some("[::1]:8080")
        );
    }

    #[test]
    fn empty_list_permits_everything() {
        let origins = AllowedOrigins::from_config::<&str>(&[]).unwrap();
        assert!(origins.is_unrestricted());
        assert!(origins.permits("https://anything.example.org/x.jpg"));
        assert!(origins.permits("http://127.0.0.1:9000/x.jpg"));
    }

    #[test]
    fn listed_host_is_permitted() {
        let origins =
            AllowedOrigins::from_config(&["https://img.example.com", "http://cdn.example.com:8080"])
                .unwrap();
        assert!(origins.permits("https://img.example.com/a/b.png"));
        assert!(origins.permits("http://cdn.example.com:8080/c.png"));
    }

    #[test]
    fn scheme_is_not_compared() {
        let origins = AllowedOrigins::from_config(&["https://img.example.com"]).unwrap();
        assert!(origins.permits("http://img.example.com/a.png"));
    }

    #[test]
    fn unlisted_host_is_rejected() {
        let origins = AllowedOrigins::from_config(&["https://img.example.com"]).unwrap();
        assert!(!origins.permits("https://evil.example.com/a.png"));
    }

    #[test]
    fn port_must_match_exactly() {
        let origins = AllowedOrigins::from_config(&["http://cdn.example.com:8080"]).unwrap();
        assert!(!origins.permits("http://cdn.example.com/a.png"));
        assert!(!origins.permits("http://cdn.example.com:9090/a.png"));
    }

    #[test]
    fn no_subdomain_matching() {
        let origins = AllowedOrigins::from_config(&["https://example.com"]).unwrap();
        assert!(!origins.permits("https://img.example.com/a.png"));
        assert!(!origins.permits("https://example.com.evil.org/a.png"));
    }

    #[test]
    fn host_comparison_ignores_case() {
        let origins = AllowedOrigins::from_config(&["https://IMG.Example.com"]).unwrap();
        assert!(origins.permits("https://img.example.COM/a.png"));
    }

    #[test]
    fn origin_without_scheme_is_config_error() {
        let err = AllowedOrigins::from_config(&["img.example.com"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin { ref origin, .. } if origin == "img.example.com"));
    }

    #[test]
    fn origin_without_host_is_config_error() {
        assert!(AllowedOrigins::from_config(&["mailto:someone@example.com"]).is_err());
    }
}
