//! Response headers forwarded to the caller for cache control.
//!
//! Only cache-control headers are passed on, not validators (`ETag`), following
//! <https://developer.mozilla.org/en-US/docs/Web/HTTP/Caching>.

use http::header::{HeaderMap, HeaderName, CACHE_CONTROL, EXPIRES, LAST_MODIFIED, PRAGMA, VARY};

pub const CACHE_HEADERS: [HeaderName; 5] = [CACHE_CONTROL, EXPIRES, LAST_MODIFIED, PRAGMA, VARY];

pub fn is_cache_header(name: &HeaderName) -> bool {
    CACHE_HEADERS.contains(name)
}

/// Copy every value of each allow-listed header, in order, into a fresh map.
pub fn filter_cache_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();
    for (name, value) in upstream {
        if is_cache_header(name) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}
