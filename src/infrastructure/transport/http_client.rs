use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;
use crate::domain::exchange::{ProxyRequest, ResponseSnapshot};
use crate::domain::transport::NetworkTransport;

/// Headers that describe a single connection and must not be forwarded
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Network transport over reqwest
///
/// Redirects are not followed: a 3xx is handed back to the client like any other
/// response.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl NetworkTransport for ReqwestTransport {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ResponseSnapshot, DomainError> {
        let method = reqwest::Method::from_bytes(request.method().as_bytes()).map_err(|e| {
            DomainError::validation(format!("Invalid method '{}': {}", request.method(), e))
        })?;

        let mut outbound = self.client.request(method, request.url().clone());

        for (name, value) in request.headers() {
            if !is_hop_by_hop(name) {
                outbound = outbound.header(name.as_str(), value.as_str());
            }
        }

        if !request.body().is_empty() {
            outbound = outbound.body(request.body().clone());
        }

        let response = outbound.send().await.map_err(|e| {
            DomainError::transport(format!("Request to {} failed: {}", request.url(), e))
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await.map_err(|e| {
            DomainError::transport(format!("Failed to read body from {}: {}", request.url(), e))
        })?;

        Ok(ResponseSnapshot::new(status)
            .with_headers(headers)
            .with_body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_captures_status_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/static/logo.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![137u8, 80, 78, 71]),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let request = ProxyRequest::get(&format!("{}/static/logo.png", server.uri())).unwrap();

        let snapshot = transport.fetch(&request).await.unwrap();

        assert_eq!(snapshot.status(), 200);
        assert_eq!(snapshot.header("content-type"), Some("image/png"));
        assert_eq!(snapshot.body().as_ref(), &[137u8, 80, 78, 71]);
    }

    #[tokio::test]
    async fn test_http_error_status_is_not_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/lanes"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let request = ProxyRequest::get(&format!("{}/api/lanes", server.uri())).unwrap();

        let snapshot = transport.fetch(&request).await.unwrap();
        assert_eq!(snapshot.status(), 500);
    }

    #[tokio::test]
    async fn test_redirects_are_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let request = ProxyRequest::get(&format!("{}/old", server.uri())).unwrap();

        let snapshot = transport.fetch(&request).await.unwrap();
        assert_eq!(snapshot.status(), 302);
        assert_eq!(snapshot.header("location"), Some("/new"));
    }

    #[tokio::test]
    async fn test_forwards_method_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/readers"))
            .and(header("x-reader", "lane-1"))
            .and(body_string("{\"on\":true}"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let url = url::Url::parse(&format!("{}/api/readers", server.uri())).unwrap();
        let request = ProxyRequest::new("POST", url)
            .with_header("X-Reader", "lane-1")
            .with_header("Connection", "keep-alive")
            .with_body("{\"on\":true}");

        let snapshot = transport.fetch(&request).await.unwrap();
        assert_eq!(snapshot.status(), 201);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = ReqwestTransport::new(Duration::from_millis(500)).unwrap();
        let request = ProxyRequest::get("http://127.0.0.1:1/unreachable").unwrap();

        let result = transport.fetch(&request).await;
        assert!(matches!(result, Err(DomainError::Transport { .. })));
    }

    #[test]
    fn test_hop_by_hop_detection() {
        assert!(is_hop_by_hop("Connection"));
        assert!(is_hop_by_hop("transfer-encoding"));
        assert!(!is_hop_by_hop("content-type"));
    }
}
