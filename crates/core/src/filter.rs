//! Eligibility check run before any cache read or write.

use crate::InterceptedRequest;

/// Browser-extension-internal schemes that are never cached.
pub const EXTENSION_SCHEMES: [&str; 4] = ["chrome-extension", "chrome-devtools", "moz-extension", "edge-extension"];

/// Why a request was left to the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("extension scheme: {0}")]
    ExtensionScheme(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("method not cacheable: {0}")]
    Method(String),
}

/// Check a request against the caching rules, in order: extension scheme,
/// non-http(s) scheme, non-GET method.
pub fn check(request: &InterceptedRequest) -> Result<(), Rejection> {
    let scheme = request.scheme();

    if EXTENSION_SCHEMES.contains(&scheme) {
        return Err(Rejection::ExtensionScheme(scheme.to_string()));
    }

    if scheme != "http" && scheme != "https" {
        return Err(Rejection::UnsupportedScheme(scheme.to_string()));
    }

    if !request.method.eq_ignore_ascii_case("GET") {
        return Err(Rejection::Method(request.method.clone()));
    }

    Ok(())
}

/// Whether the proxy should intercept and cache this request.
pub fn should_cache(request: &InterceptedRequest) -> bool {
    check(request).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn req(url: &str) -> InterceptedRequest {
        InterceptedRequest::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_accepts_http_and_https_get() {
        assert!(should_cache(&req("http://localhost:5001/")));
        assert!(should_cache(&req("https://example.com/static/css/styles.css")));
        assert!(should_cache(&InterceptedRequest::navigate(Url::parse("https://example.com/").unwrap())));
    }

    #[test]
    fn test_rejects_extension_schemes() {
        for scheme in EXTENSION_SCHEMES {
            let request = req(&format!("{scheme}://abcdef/script.js"));
            assert!(!should_cache(&request), "{scheme} should be rejected");
            assert_eq!(check(&request), Err(Rejection::ExtensionScheme(scheme.to_string())));
        }
    }

    #[test]
    fn test_rejects_other_schemes() {
        for url in ["file:///etc/hosts", "data:text/plain,hi", "ftp://example.com/file", "blob:https://example.com/1"] {
            let request = req(url);
            assert!(matches!(check(&request), Err(Rejection::UnsupportedScheme(_))), "{url}");
        }
    }

    #[test]
    fn test_rejects_non_get() {
        for method in ["POST", "PUT", "DELETE", "HEAD", "PATCH", "OPTIONS"] {
            let request = req("https://example.com/api").with_method(method);
            assert_eq!(check(&request), Err(Rejection::Method(method.to_string())));
        }
    }

    #[test]
    fn test_lowercase_get_accepted() {
        let request = req("https://example.com/").with_method("get");
        assert!(should_cache(&request));
    }
}
