//! Request classification

use std::sync::Arc;

use serde::Serialize;

use super::config::PolicyConfig;
use crate::domain::exchange::ProxyRequest;

/// Caching class of an intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    /// Cache-first
    Static,
    /// Network-first, cache fallback, JSON offline error
    Api,
    /// Network-first, cache fallback, offline landing page
    Document,
    /// Left to the default network behavior
    Unhandled,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Static => "static",
            ResourceClass::Api => "api",
            ResourceClass::Document => "document",
            ResourceClass::Unhandled => "unhandled",
        }
    }
}

impl std::fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a request to exactly one class; the first matching rule wins
#[derive(Debug, Clone)]
pub struct PolicyClassifier {
    config: Arc<PolicyConfig>,
}

impl PolicyClassifier {
    pub fn new(config: Arc<PolicyConfig>) -> Self {
        Self { config }
    }

    /// Classifies by path, host and whether the client accepts HTML. Pure and total.
    pub fn classify(&self, path: &str, host: &str, accepts_html: bool) -> ResourceClass {
        if self.is_static(path, host) {
            ResourceClass::Static
        } else if self.is_api(path) {
            ResourceClass::Api
        } else if accepts_html {
            ResourceClass::Document
        } else {
            ResourceClass::Unhandled
        }
    }

    pub fn classify_request(&self, request: &ProxyRequest) -> ResourceClass {
        self.classify(request.path(), request.host(), request.accepts_html())
    }

    fn is_static(&self, path: &str, host: &str) -> bool {
        path.starts_with(&self.config.static_prefix)
            || self
                .config
                .trusted_asset_hosts
                .iter()
                .any(|trusted| trusted.eq_ignore_ascii_case(host))
    }

    fn is_api(&self, path: &str) -> bool {
        self.config
            .api_patterns
            .iter()
            .any(|pattern| path.contains(pattern.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PolicyClassifier {
        PolicyClassifier::new(Arc::new(PolicyConfig::default()))
    }

    #[test]
    fn test_static_prefix() {
        assert_eq!(
            classifier().classify("/static/logo.png", "app.local", false),
            ResourceClass::Static
        );
    }

    #[test]
    fn test_trusted_host_is_static() {
        assert_eq!(
            classifier().classify("/npm/bootstrap.min.css", "CDN.JSDELIVR.NET", false),
            ResourceClass::Static
        );
    }

    #[test]
    fn test_api_substring_not_prefix() {
        let classifier = classifier();

        assert_eq!(
            classifier.classify("/v2/api/users", "app.local", false),
            ResourceClass::Api
        );
        assert_eq!(
            classifier.classify("/dashboard/lanes", "app.local", true),
            ResourceClass::Api
        );
    }

    #[test]
    fn test_static_wins_over_api() {
        assert_eq!(
            classifier().classify("/static/api/schema.json", "app.local", false),
            ResourceClass::Static
        );
    }

    #[test]
    fn test_document_needs_html_accept() {
        let classifier = classifier();

        assert_eq!(
            classifier.classify("/dashboard", "app.local", true),
            ResourceClass::Document
        );
        assert_eq!(
            classifier.classify("/dashboard", "app.local", false),
            ResourceClass::Unhandled
        );
    }

    #[test]
    fn test_untrusted_host_falls_through() {
        assert_eq!(
            classifier().classify("/npm/x.js", "evil.example", false),
            ResourceClass::Unhandled
        );
    }

    #[test]
    fn test_classify_request_reads_accept_header() {
        let request = ProxyRequest::get("http://app.local/profile")
            .unwrap()
            .with_header("Accept", "text/html");

        assert_eq!(
            classifier().classify_request(&request),
            ResourceClass::Document
        );
    }
}
