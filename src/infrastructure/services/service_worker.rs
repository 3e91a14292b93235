//! Event dispatcher composing policy, strategies, lifecycle and notifications

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::DomainError;
use crate::domain::exchange::ProxyRequest;
use crate::domain::host::HostController;
use crate::domain::partition::PartitionStore;
use crate::domain::policy::{PolicyClassifier, PolicyConfig, ResourceClass};
use crate::domain::transport::NetworkTransport;
use crate::domain::worker::{
    ActivationReport, FetchOutcome, LifecycleState, NotificationClick, PushOutcome, SyncOutcome,
    WorkerEvents,
};

use super::lifecycle_manager::LifecycleManager;
use super::notification_bridge::{NotificationBridge, NotificationConfig};
use super::strategy_executor::StrategyExecutor;

/// One worker instance bound to a single policy version
#[derive(Debug)]
pub struct ServiceWorker {
    config: Arc<PolicyConfig>,
    classifier: PolicyClassifier,
    executor: StrategyExecutor,
    lifecycle: LifecycleManager,
    bridge: NotificationBridge,
}

impl ServiceWorker {
    pub fn new(
        config: Arc<PolicyConfig>,
        notifications: NotificationConfig,
        store: Arc<dyn PartitionStore>,
        transport: Arc<dyn NetworkTransport>,
        host: Arc<dyn HostController>,
    ) -> Self {
        Self {
            classifier: PolicyClassifier::new(config.clone()),
            executor: StrategyExecutor::new(config.clone(), store.clone(), transport.clone()),
            lifecycle: LifecycleManager::new(config.clone(), store, transport, host.clone()),
            bridge: NotificationBridge::new(notifications, host),
            config,
        }
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    /// Retires this instance once a newer version has taken over
    pub fn supersede(&self) -> Result<(), DomainError> {
        self.lifecycle.supersede()
    }
}

#[async_trait]
impl WorkerEvents for ServiceWorker {
    async fn install(&self) -> Result<(), DomainError> {
        self.lifecycle.install().await
    }

    async fn activate(&self) -> Result<ActivationReport, DomainError> {
        self.lifecycle.activate().await
    }

    async fn fetch(&self, request: &ProxyRequest) -> FetchOutcome {
        if !request.is_get() {
            return FetchOutcome::PassThrough;
        }

        if !self.lifecycle.is_active() {
            debug!(url = %request.url(), state = %self.lifecycle.state(), "Not intercepting");
            return FetchOutcome::PassThrough;
        }

        match self.classifier.classify_request(request) {
            ResourceClass::Unhandled => FetchOutcome::PassThrough,
            class => FetchOutcome::Respond(self.executor.handle(request, class).await),
        }
    }

    async fn push(&self, payload: &[u8]) -> PushOutcome {
        self.bridge.on_push_received(payload).await
    }

    async fn notification_click(&self, click: NotificationClick) -> Result<(), DomainError> {
        self.bridge.on_notification_activated(click).await
    }

    async fn sync(&self, tag: &str) -> SyncOutcome {
        self.bridge.on_sync(tag).await
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }
}
