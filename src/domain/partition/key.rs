//! Request key normalization

use url::Url;

use crate::domain::exchange::ProxyRequest;

/// Normalized (method, absolute URL) identity of a cached entry
///
/// Only GET is cache-eligible, so every key carries the `GET` method.
/// `url::Url` already lowercases scheme and host and drops default ports;
/// the fragment is stripped here since it never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    /// Builds the key for a GET of `url`
    pub fn for_url(url: &Url) -> Self {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        Self(format!("GET {}", normalized))
    }

    /// Builds the key for an intercepted request, `None` when the method is not cacheable
    pub fn for_request(request: &ProxyRequest) -> Option<Self> {
        request.is_get().then(|| Self::for_url(request.url()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
