//! Parse raw response header lines delivered by libcurl.

use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH};

/// Header block of the most recent response seen on a transfer.
///
/// libcurl hands over the headers of every response on the wire (interim
/// `100 Continue`, each redirect hop), so a status line starts a new block.
#[derive(Debug, Default)]
pub(crate) struct HeaderBlock {
    pub status: Option<u32>,
    pub headers: HeaderMap,
    /// Blank line after the headers was seen.
    pub complete: bool,
}

impl HeaderBlock {
    pub fn push_line(&mut self, raw: &[u8]) {
        let line = trim_ascii(raw);
        if line.starts_with(b"HTTP/") {
            *self = HeaderBlock {
                status: parse_status(line),
                ..HeaderBlock::default()
            };
            return;
        }
        if line.is_empty() {
            self.complete = true;
            return;
        }
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            tracing::debug!(line = %String::from_utf8_lossy(line), "dropping malformed upstream header line");
            return;
        };
        let name = HeaderName::from_bytes(trim_ascii(&line[..colon]));
        let value = HeaderValue::from_bytes(trim_ascii(&line[colon + 1..]));
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => {
                tracing::debug!(line = %String::from_utf8_lossy(line), "dropping malformed upstream header line");
            }
        }
    }

    /// True once the header block of a final (non-interim, non-followed) response is complete.
    pub fn is_final(&self, follow_redirects: bool) -> bool {
        let Some(status) = self.status else {
            return false;
        };
        let followed_redirect = follow_redirects && matches!(status, 301 | 302 | 303 | 307 | 308);
        self.complete && status >= 200 && !followed_redirect
    }
}

/// `Content-Length` as a signed integer. Missing or unparseable values read as 0.
pub fn content_length(headers: &HeaderMap) -> i64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

fn parse_status(line: &[u8]) -> Option<u32> {
    let line = std::str::from_utf8(line).ok()?;
    line.split_whitespace().nth(1)?.parse().ok()
}

fn trim_ascii(mut s: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = s {
        if first.is_ascii_whitespace() {
            s = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = s {
        if last.is_ascii_whitespace() {
            s = rest;
        } else {
            break;
        }
    }
    s
}
