//! Response snapshots returned by the network and stored in a generation.

use bytes::Bytes;

/// An HTTP response. The body is reference-counted, so `clone()` yields an
/// independent snapshot that can be persisted while the original is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL the body was served from, if known.
    pub url: Option<String>,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { url: None, status, headers: Vec::new(), body: body.into() }
    }

    /// Terminal response synthesized when a sub-resource cannot be reached.
    pub fn offline(status: u16, body: &str) -> Self {
        Self::new(status, body.to_owned()).with_header("content-type", "text/plain;charset=UTF-8")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only a plain 200 is ever written by the fetch strategies.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// First header value with the given (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
