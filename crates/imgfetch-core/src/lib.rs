pub mod config;
pub mod logging;

pub mod cache_headers;
pub mod error;
pub mod origin;
pub mod request;
pub mod source;
pub mod transport;

pub use error::{ConfigError, ErrorKind, FetchError};
pub use source::{FetchedImage, ImageSource, SourceType};

/// `User-Agent` sent on every outbound request.
pub const USER_AGENT: &str = concat!("imgfetch/", env!("CARGO_PKG_VERSION"));
