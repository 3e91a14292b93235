//! Application state for shared services

use std::sync::Arc;

use url::Url;

use crate::domain::partition::PartitionStore;
use crate::domain::transport::NetworkTransport;
use crate::infrastructure::host::BroadcastHostController;
use crate::infrastructure::services::Registration;

/// Everything the proxy and control handlers share
#[derive(Debug, Clone)]
pub struct AppState {
    pub registration: Arc<Registration>,
    pub store: Arc<dyn PartitionStore>,
    /// Used for requests the worker does not intercept
    pub transport: Arc<dyn NetworkTransport>,
    pub host: Arc<BroadcastHostController>,
    /// Origin-form requests are resolved against this
    pub upstream: Url,
    /// Hosts besides the upstream that absolute-form requests may target
    pub trusted_hosts: Vec<String>,
}

impl AppState {
    pub fn new(
        registration: Arc<Registration>,
        store: Arc<dyn PartitionStore>,
        transport: Arc<dyn NetworkTransport>,
        host: Arc<BroadcastHostController>,
        upstream: Url,
    ) -> Self {
        Self {
            registration,
            store,
            transport,
            host,
            upstream,
            trusted_hosts: Vec::new(),
        }
    }

    pub fn with_trusted_hosts(mut self, hosts: Vec<String>) -> Self {
        self.trusted_hosts = hosts;
        self
    }
}
