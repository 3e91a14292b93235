//! Offline Gateway
//!
//! An offline-first caching gateway. Requests are classified per resource class and
//! served cache-first or network-first from versioned response partitions, so a client
//! keeps working when the upstream is unreachable:
//! - Static assets are provisioned at install time and served cache-first
//! - API calls are served network-first with a cached fallback
//! - Page navigations fall back to an offline landing page
//! - Push messages become host notifications

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use url::Url;

use api::AppState;
use domain::host::HostController;
use domain::partition::PartitionStore;
use domain::transport::NetworkTransport;
use infrastructure::host::BroadcastHostController;
use infrastructure::partition::PartitionStoreFactory;
use infrastructure::services::{Registration, ServiceWorker};
use infrastructure::transport::ReqwestTransport;

/// Host event channel capacity; slow SSE subscribers past this lag and skip events
const HOST_EVENT_CAPACITY: usize = 256;

/// Builds the application state with one worker registered for the configured version
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let policy = Arc::new(config.to_policy().context("Invalid policy configuration")?);
    let upstream = Url::parse(&config.upstream.base_url)
        .with_context(|| format!("Invalid upstream URL '{}'", config.upstream.base_url))?;

    info!(
        backend = %config.storage.backend,
        version = %policy.version,
        upstream = %upstream,
        "Creating gateway"
    );

    let store = PartitionStoreFactory::new()
        .create(&config.storage)
        .await
        .context("Failed to create partition store")?;
    let transport: Arc<dyn NetworkTransport> =
        Arc::new(ReqwestTransport::new(config.upstream_timeout())?);
    let host = Arc::new(BroadcastHostController::new(HOST_EVENT_CAPACITY));

    let trusted_hosts = policy.trusted_asset_hosts.clone();
    let registration = Arc::new(Registration::new());
    registration.register(create_worker(
        config,
        policy,
        store.clone(),
        transport.clone(),
        host.clone(),
    ))?;

    Ok(
        AppState::new(registration, store, transport, host, upstream)
            .with_trusted_hosts(trusted_hosts),
    )
}

fn create_worker(
    config: &AppConfig,
    policy: Arc<domain::policy::PolicyConfig>,
    store: Arc<dyn PartitionStore>,
    transport: Arc<dyn NetworkTransport>,
    host: Arc<dyn HostController>,
) -> ServiceWorker {
    ServiceWorker::new(
        policy,
        config.notifications.clone(),
        store,
        transport,
        host,
    )
}
