//! Per-class fetch strategies

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::domain::DomainError;
use crate::domain::exchange::{ProxyRequest, ProxyResponse, ResponseSnapshot};
use crate::domain::partition::{PartitionStore, RequestKey};
use crate::domain::policy::{PolicyConfig, ResourceClass};
use crate::domain::transport::NetworkTransport;
use crate::infrastructure::observability::record_fetch;

/// What a network-first strategy serves when both network and cache come up empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OfflineFallback {
    /// 503 with the JSON error body
    ApiError,
    /// The cached offline landing page
    LandingPage,
}

/// Runs cache-first or network-first strategies against the partition store and the network
///
/// Holds no state of its own; every call reads and writes through the store. Cache writes
/// complete before the response is returned.
#[derive(Debug, Clone)]
pub struct StrategyExecutor {
    config: Arc<PolicyConfig>,
    store: Arc<dyn PartitionStore>,
    transport: Arc<dyn NetworkTransport>,
}

impl StrategyExecutor {
    pub fn new(
        config: Arc<PolicyConfig>,
        store: Arc<dyn PartitionStore>,
        transport: Arc<dyn NetworkTransport>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
        }
    }

    /// Produces the response for a classified request
    pub async fn handle(&self, request: &ProxyRequest, class: ResourceClass) -> ProxyResponse {
        let start = Instant::now();

        let response = match class {
            ResourceClass::Static => self.cache_first(request).await,
            ResourceClass::Api => self.network_first(request, OfflineFallback::ApiError).await,
            ResourceClass::Document => {
                self.network_first(request, OfflineFallback::LandingPage).await
            }
            ResourceClass::Unhandled => self.forward(request).await,
        };

        debug!(
            url = %request.url(),
            class = %class,
            source = %response.source,
            status = response.snapshot.status(),
            "Strategy complete"
        );
        record_fetch(class, response.source, start.elapsed());

        response
    }

    async fn cache_first(&self, request: &ProxyRequest) -> ProxyResponse {
        let Some(key) = RequestKey::for_request(request) else {
            return self.forward(request).await;
        };
        let partition = self.config.static_partition();

        if let Some(hit) = self.lookup(&key, Some(&partition)).await {
            return ProxyResponse::from_cache(hit);
        }

        match self.fetch_network(request).await {
            Ok(snapshot) => {
                if snapshot.is_ok() {
                    self.store_copy(&partition, &key, &snapshot).await;
                }
                ProxyResponse::from_network(snapshot)
            }
            Err(e) => {
                info!(url = %request.url(), error = %e, "Static resource unavailable offline");
                ProxyResponse::fallback(ResponseSnapshot::offline_static())
            }
        }
    }

    async fn network_first(
        &self,
        request: &ProxyRequest,
        fallback: OfflineFallback,
    ) -> ProxyResponse {
        let Some(key) = RequestKey::for_request(request) else {
            return self.forward(request).await;
        };

        match self.fetch_network(request).await {
            Ok(snapshot) if snapshot.is_ok() => {
                self.store_copy(&self.config.dynamic_partition(), &key, &snapshot)
                    .await;
                return ProxyResponse::from_network(snapshot);
            }
            Ok(snapshot) => {
                debug!(
                    url = %request.url(),
                    status = snapshot.status(),
                    "Upstream returned error status, trying cache"
                );
            }
            Err(e) => {
                info!(url = %request.url(), error = %e, "Network failed, trying cache");
            }
        }

        if let Some(hit) = self.lookup(&key, None).await {
            return ProxyResponse::from_cache(hit);
        }

        match fallback {
            OfflineFallback::ApiError => ProxyResponse::fallback(ResponseSnapshot::offline_api()),
            OfflineFallback::LandingPage => self.offline_page().await,
        }
    }

    async fn offline_page(&self) -> ProxyResponse {
        let page = match self.config.offline_page_key() {
            Ok(key) => self.lookup(&key, None).await,
            Err(e) => {
                warn!(error = %e, "Offline page key cannot be resolved");
                None
            }
        };

        match page {
            Some(snapshot) => ProxyResponse::fallback(snapshot),
            None => {
                warn!(page = %self.config.offline_page, "Offline page is not cached");
                ProxyResponse::fallback(ResponseSnapshot::offline_document())
            }
        }
    }

    /// Sends the request unmodified and returns whatever comes back
    async fn forward(&self, request: &ProxyRequest) -> ProxyResponse {
        match self.fetch_network(request).await {
            Ok(snapshot) => ProxyResponse::from_network(snapshot),
            Err(e) => {
                warn!(url = %request.url(), error = %e, "Forwarded request failed");
                ProxyResponse::fallback(ResponseSnapshot::bad_gateway())
            }
        }
    }

    async fn fetch_network(&self, request: &ProxyRequest) -> Result<ResponseSnapshot, DomainError> {
        tokio::time::timeout(self.config.network_timeout, self.transport.fetch(request))
            .await
            .map_err(|_| {
                DomainError::transport(format!(
                    "Request to {} timed out after {:?}",
                    request.url(),
                    self.config.network_timeout
                ))
            })?
    }

    /// Lookup failures degrade to a miss
    async fn lookup(&self, key: &RequestKey, partition: Option<&str>) -> Option<ResponseSnapshot> {
        match self.store.match_entry(key, partition).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Write failures are logged; the response is still served
    async fn store_copy(&self, partition: &str, key: &RequestKey, snapshot: &ResponseSnapshot) {
        if !snapshot.is_shareable() {
            debug!(key = %key, "Not caching per-user response");
            return;
        }

        if let Err(e) = self.store.put(partition, key, snapshot.clone()).await {
            warn!(partition = %partition, key = %key, error = %e, "Failed to cache response");
        }
    }
}
