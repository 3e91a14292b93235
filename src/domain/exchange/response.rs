//! Response snapshots and the synthetic offline responses

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Body of the offline API fallback, reproduced byte for byte
pub const OFFLINE_API_BODY: &str =
    r#"{"error":"No internet connection","message":"Please check your connection and try again"}"#;

/// Body of the offline static-asset fallback
pub const OFFLINE_STATIC_BODY: &str = "Resource not available offline";

/// An immutable capture of a response: status, headers and body bytes
///
/// Cloning shares the body buffer; nothing mutates a snapshot after construction,
/// so the copy handed to the caller and the copy persisted are independent values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    status: u16,
    headers: Vec<(String, String)>,
    #[serde(with = "body_base64")]
    body: Bytes,
}

impl ResponseSnapshot {
    /// Creates an empty response with the given status
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a response with a body and content type
    pub fn with_content(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self::new(status)
            .with_header("Content-Type", content_type)
            .with_body(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// "ok" for caching purposes means 2xx or 3xx
    pub fn is_ok(&self) -> bool {
        (200..=399).contains(&self.status)
    }

    /// Whether the response may be replayed to any client from the shared cache.
    /// Responses that set cookies or are marked `private`/`no-store` are per-user.
    pub fn is_shareable(&self) -> bool {
        if self.header("set-cookie").is_some() {
            return false;
        }

        self.header("cache-control").is_none_or(|value| {
            !value.split(',').any(|directive| {
                let directive = directive.trim();
                directive.eq_ignore_ascii_case("private")
                    || directive.eq_ignore_ascii_case("no-store")
            })
        })
    }

    /// HTTP 503 returned to API requests when neither network nor cache can answer
    pub fn offline_api() -> Self {
        Self::with_content(503, "application/json", OFFLINE_API_BODY)
    }

    /// HTTP 404 returned to static-asset requests that miss the cache while offline
    pub fn offline_static() -> Self {
        Self::with_content(404, "text/plain", OFFLINE_STATIC_BODY)
    }

    /// Terminal fallback when the offline landing page itself was never cached
    pub fn offline_document() -> Self {
        Self::with_content(503, "text/html", Bytes::new())
    }

    /// Returned when a pass-through request cannot reach the upstream at all
    pub fn bad_gateway() -> Self {
        Self::with_content(502, "text/plain", "Bad Gateway")
    }
}

mod body_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

/// Where the body handed back to the client came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
    Fallback,
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseSource::Cache => write!(f, "cache"),
            ResponseSource::Network => write!(f, "network"),
            ResponseSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Result of running a strategy for one intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub snapshot: ResponseSnapshot,
    pub source: ResponseSource,
}

impl ProxyResponse {
    pub fn from_cache(snapshot: ResponseSnapshot) -> Self {
        Self {
            snapshot,
            source: ResponseSource::Cache,
        }
    }

    pub fn from_network(snapshot: ResponseSnapshot) -> Self {
        Self {
            snapshot,
            source: ResponseSource::Network,
        }
    }

    pub fn fallback(snapshot: ResponseSnapshot) -> Self {
        Self {
            snapshot,
            source: ResponseSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_range_covers_redirects() {
        assert!(ResponseSnapshot::new(200).is_ok());
        assert!(ResponseSnapshot::new(304).is_ok());
        assert!(!ResponseSnapshot::new(199).is_ok());
        assert!(!ResponseSnapshot::new(404).is_ok());
        assert!(!ResponseSnapshot::new(500).is_ok());
    }

    #[test]
    fn test_per_user_responses_are_not_shareable() {
        assert!(ResponseSnapshot::new(200).is_shareable());
        assert!(
            ResponseSnapshot::new(200)
                .with_header("Cache-Control", "public, max-age=60")
                .is_shareable()
        );
        assert!(
            !ResponseSnapshot::new(200)
                .with_header("Set-Cookie", "session=abc")
                .is_shareable()
        );
        assert!(
            !ResponseSnapshot::new(200)
                .with_header("Cache-Control", "max-age=0, Private")
                .is_shareable()
        );
        assert!(
            !ResponseSnapshot::new(200)
                .with_header("cache-control", "no-store")
                .is_shareable()
        );
    }

    #[test]
    fn test_offline_api_is_bit_exact() {
        let response = ResponseSnapshot::offline_api();

        assert_eq!(response.status(), 503);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(
            response.body().as_ref(),
            br#"{"error":"No internet connection","message":"Please check your connection and try again"}"#
        );
    }

    #[test]
    fn test_offline_static() {
        let response = ResponseSnapshot::offline_static();

        assert_eq!(response.status(), 404);
        assert_eq!(response.body().as_ref(), b"Resource not available offline");
    }

    #[test]
    fn test_snapshot_json_preserves_binary_body() {
        let snapshot = ResponseSnapshot::with_content(200, "image/png", vec![0u8, 159, 146, 150]);

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: ResponseSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_clone_is_independent_of_later_rebuilds() {
        let original = ResponseSnapshot::with_content(200, "text/plain", "v1");
        let stored = original.clone();
        let replaced = original.with_body("v2");

        assert_eq!(stored.body().as_ref(), b"v1");
        assert_eq!(replaced.body().as_ref(), b"v2");
    }
}
