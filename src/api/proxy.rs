//! Fallback handler: every request outside the control API is a fetch event

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};
use url::Url;

use super::state::AppState;
use super::types::ApiError;
use crate::domain::exchange::{ProxyRequest, ResponseSnapshot, ResponseSource};
use crate::domain::worker::{FetchOutcome, WorkerEvents};

/// Largest request body buffered for forwarding
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Response header naming where a worker-produced response came from
pub const SOURCE_HEADER: &str = "x-gateway-source";

pub async fn proxy(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    let request = into_proxy_request(&state, request).await?;

    let outcome = match state.registration.active() {
        Some(worker) => worker.fetch(&request).await,
        None => FetchOutcome::PassThrough,
    };

    match outcome {
        FetchOutcome::Respond(response) => Ok(into_response(
            &response.snapshot,
            Some(response.source),
        )),
        FetchOutcome::PassThrough => {
            debug!(method = %request.method(), url = %request.url(), "Passing through");

            let snapshot = match state.transport.fetch(&request).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(url = %request.url(), error = %e, "Pass-through request failed");
                    ResponseSnapshot::bad_gateway()
                }
            };
            Ok(into_response(&snapshot, None))
        }
    }
}

/// Origin-form targets always land on the upstream. Absolute-form targets are kept only
/// when they name the upstream host or a trusted asset host.
pub(crate) fn resolve_target(
    upstream: &Url,
    trusted_hosts: &[String],
    request: &Request,
) -> Result<Url, ApiError> {
    let uri = request.uri();

    if uri.scheme().is_none() {
        let mut url = upstream.clone();
        url.set_path(uri.path());
        url.set_query(uri.query());
        return Ok(url);
    }

    let url = Url::parse(&uri.to_string())
        .map_err(|e| ApiError::bad_request(format!("Invalid request target '{}': {}", uri, e)))?;

    if is_allowed_target(upstream, trusted_hosts, &url) {
        Ok(url)
    } else {
        warn!(url = %url, "Rejecting request for a host outside the upstream");
        Err(ApiError::bad_request(format!(
            "Request target '{}' is not an allowed host",
            url
        )))
    }
}

fn is_allowed_target(upstream: &Url, trusted_hosts: &[String], url: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    let Some(host) = url.host_str() else {
        return false;
    };

    let is_upstream = upstream.host_str() == Some(host)
        && upstream.port_or_known_default() == url.port_or_known_default();

    is_upstream
        || trusted_hosts
            .iter()
            .any(|trusted| trusted.eq_ignore_ascii_case(host))
}

async fn into_proxy_request(state: &AppState, request: Request) -> Result<ProxyRequest, ApiError> {
    let url = resolve_target(&state.upstream, &state.trusted_hosts, &request)?;
    let (parts, body) = request.into_parts();

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::payload_too_large(format!("Cannot buffer request body: {}", e)))?;

    Ok(ProxyRequest::new(parts.method.as_str(), url)
        .with_headers(headers)
        .with_body(body))
}

pub(crate) fn into_response(snapshot: &ResponseSnapshot, source: Option<ResponseSource>) -> Response {
    let status = StatusCode::from_u16(snapshot.status()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, Body::from(snapshot.body().clone())).into_response();
    let headers = response.headers_mut();

    for (name, value) in snapshot.headers() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => debug!(header = %name, "Dropping invalid header"),
        }
    }

    if let Some(source) = source {
        headers.insert(SOURCE_HEADER, HeaderValue::from_static(source_label(source)));
    }

    response
}

fn source_label(source: ResponseSource) -> &'static str {
    match source {
        ResponseSource::Cache => "cache",
        ResponseSource::Network => "network",
        ResponseSource::Fallback => "fallback",
    }
}
