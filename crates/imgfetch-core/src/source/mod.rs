//! Image sources.
//!
//! A dispatcher builds every registered source once and asks each one whether
//! it `matches` an inbound request; the first match serves the image.

mod http;
mod registry;

pub use self::http::HttpImageSource;
pub use registry::{register_builtin_sources, select, SourceFactory, SourceRegistry};

use crate::error::FetchError;
use ::http::{HeaderMap, Request};
use std::fmt;

/// Name a source registers under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceType(&'static str);

impl SourceType {
    pub const HTTP: SourceType = SourceType("http");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Image bytes plus the cache-control headers forwarded from upstream.
#[derive(Debug, Clone, Default)]
pub struct FetchedImage {
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

/// Something that can serve image bytes for an inbound request.
pub trait ImageSource: Send + Sync {
    /// Routing predicate. Must be cheap and side-effect free.
    fn matches(&self, req: &Request<()>) -> bool;

    fn get_image_with_cache_headers(&self, req: &Request<()>) -> Result<FetchedImage, FetchError>;

    fn get_image(&self, req: &Request<()>) -> Result<Vec<u8>, FetchError> {
        self.get_image_with_cache_headers(req).map(|image| image.body)
    }
}
