//! Install and activate phases

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::domain::DomainError;
use crate::domain::exchange::{ProxyRequest, ResponseSnapshot};
use crate::domain::host::HostController;
use crate::domain::partition::{PartitionStore, RequestKey};
use crate::domain::policy::PolicyConfig;
use crate::domain::transport::NetworkTransport;
use crate::domain::worker::{ActivationReport, LifecycleState};
use crate::infrastructure::observability::record_partitions_deleted;

/// Governs partition existence for one policy version
///
/// Provisioning is all-or-nothing: every manifest entry is fetched before anything is
/// written, and a partition created by a failed attempt is removed again.
#[derive(Debug)]
pub struct LifecycleManager {
    config: Arc<PolicyConfig>,
    store: Arc<dyn PartitionStore>,
    transport: Arc<dyn NetworkTransport>,
    host: Arc<dyn HostController>,
    state: watch::Sender<LifecycleState>,
}

impl LifecycleManager {
    pub fn new(
        config: Arc<PolicyConfig>,
        store: Arc<dyn PartitionStore>,
        transport: Arc<dyn NetworkTransport>,
        host: Arc<dyn HostController>,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::Uninstalled);

        Self {
            config,
            store,
            transport,
            host,
            state,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// Observes state changes
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Provisioning phase
    #[instrument(skip(self), fields(version = %self.config.version))]
    pub async fn install(&self) -> Result<(), DomainError> {
        self.transition(LifecycleState::Provisioning)?;
        info!("Provisioning static partition");

        match self.provision().await {
            Ok(count) => {
                self.transition(LifecycleState::Ready)?;
                info!(entries = count, "Provisioning complete");

                if let Err(e) = self.host.skip_waiting().await {
                    warn!(error = %e, "Host rejected skip-waiting signal");
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Provisioning failed");
                self.transition(LifecycleState::Uninstalled)?;
                Err(e)
            }
        }
    }

    /// Activation phase
    #[instrument(skip(self), fields(version = %self.config.version))]
    pub async fn activate(&self) -> Result<ActivationReport, DomainError> {
        self.transition(LifecycleState::Activating)?;
        info!("Activating");

        match self.retire_stale_partitions().await {
            Ok(report) => {
                if let Err(e) = self.host.claim_active_sessions().await {
                    warn!(error = %e, "Host failed to claim active sessions");
                }
                self.transition(LifecycleState::Active)?;
                info!(
                    deleted = report.deleted.len(),
                    retained = report.retained.len(),
                    "Activation complete"
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Activation failed");
                self.transition(LifecycleState::Ready)?;
                Err(e)
            }
        }
    }

    /// Marks this instance as superseded by a newer one
    pub fn supersede(&self) -> Result<(), DomainError> {
        self.transition(LifecycleState::Redundant)
    }

    async fn provision(&self) -> Result<usize, DomainError> {
        let urls = self.config.manifest_urls()?;
        let entries = try_join_all(urls.iter().map(|url| self.fetch_manifest_entry(url))).await?;

        let partition = self.config.static_partition();
        let existed = self.store.has_partition(&partition).await?;
        self.store.open(&partition).await?;

        for (key, snapshot) in &entries {
            if let Err(e) = self.store.put(&partition, key, snapshot.clone()).await {
                if existed {
                    // The store has no per-entry delete; earlier entries of this version stay
                    warn!(
                        partition = %partition,
                        "Write failed in a pre-existing partition, earlier entries are kept"
                    );
                } else {
                    self.rollback(&partition).await;
                }
                return Err(e);
            }
        }

        Ok(entries.len())
    }

    async fn fetch_manifest_entry(
        &self,
        url: &Url,
    ) -> Result<(RequestKey, ResponseSnapshot), DomainError> {
        let request = ProxyRequest::new("GET", url.clone());

        let snapshot = tokio::time::timeout(
            self.config.network_timeout,
            self.transport.fetch(&request),
        )
        .await
        .map_err(|_| DomainError::provisioning(url.as_str(), "timed out"))?
        .map_err(|e| DomainError::provisioning(url.as_str(), e.to_string()))?;

        if !snapshot.is_ok() {
            return Err(DomainError::provisioning(
                url.as_str(),
                format!("HTTP {}", snapshot.status()),
            ));
        }

        Ok((RequestKey::for_url(url), snapshot))
    }

    async fn rollback(&self, partition: &str) {
        warn!(partition = %partition, "Rolling back partially provisioned partition");

        if let Err(e) = self.store.delete_partition(partition).await {
            error!(partition = %partition, error = %e, "Rollback failed");
        }
    }

    async fn retire_stale_partitions(&self) -> Result<ActivationReport, DomainError> {
        let (retained, stale): (Vec<String>, Vec<String>) = self
            .store
            .list_names()
            .await?
            .into_iter()
            .partition(|name| self.config.is_current_partition(name));

        let deletions = stale.iter().map(|name| async move {
            info!(partition = %name, "Deleting stale partition");
            self.store.delete_partition(name).await
        });

        // Every deletion runs to completion before the first error is reported
        for result in join_all(deletions).await {
            result?;
        }

        record_partitions_deleted(stale.len());

        Ok(ActivationReport {
            deleted: stale,
            retained,
        })
    }

    fn transition(&self, next: LifecycleState) -> Result<(), DomainError> {
        let mut rejected_from = None;

        self.state.send_if_modified(|state| {
            if state.can_transition_to(next) {
                *state = next;
                true
            } else {
                rejected_from = Some(*state);
                false
            }
        });

        match rejected_from {
            Some(from) => Err(DomainError::lifecycle(format!(
                "Cannot move from {} to {}",
                from, next
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::host::MockHostController;
    use crate::domain::partition::{FailOn, MockPartitionStore};
    use crate::domain::transport::mock::MockTransport;
    use crate::infrastructure::partition::InMemoryPartitionStore;

    const BASE: &str = "http://app.local";

    fn config() -> Arc<PolicyConfig> {
        Arc::new(
            PolicyConfig::new(Url::parse(BASE).unwrap(), "v2").with_manifest(vec![
                "/".to_string(),
                "/static/logo.png".to_string(),
                "https://cdn.jsdelivr.net/npm/bootstrap.min.css".to_string(),
            ]),
        )
    }

    fn ok(body: &'static str) -> ResponseSnapshot {
        ResponseSnapshot::with_content(200, "text/plain", body)
    }

    fn online_transport() -> MockTransport {
        MockTransport::new()
            .with_response("http://app.local/", ok("shell"))
            .with_response("http://app.local/static/logo.png", ok("logo"))
            .with_response("https://cdn.jsdelivr.net/npm/bootstrap.min.css", ok("css"))
    }

    fn permissive_host() -> MockHostController {
        let mut host = MockHostController::new();
        host.expect_skip_waiting().returning(|| Ok(()));
        host.expect_claim_active_sessions().returning(|| Ok(()));
        host
    }

    fn manager(
        store: Arc<dyn PartitionStore>,
        transport: MockTransport,
        host: MockHostController,
    ) -> LifecycleManager {
        LifecycleManager::new(config(), store, Arc::new(transport), Arc::new(host))
    }

    #[tokio::test]
    async fn test_install_populates_static_partition_and_skips_waiting() {
        let store = Arc::new(InMemoryPartitionStore::new());
        let mut host = MockHostController::new();
        host.expect_skip_waiting().times(1).returning(|| Ok(()));

        let manager = manager(store.clone(), online_transport(), host);
        manager.install().await.unwrap();

        assert_eq!(manager.state(), LifecycleState::Ready);
        let logo = RequestKey::for_url(&Url::parse("http://app.local/static/logo.png").unwrap());
        let hit = store
            .match_entry(&logo, Some("app-static-v2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.body().as_ref(), b"logo");
    }

    #[tokio::test]
    async fn test_install_failure_is_all_or_nothing_and_repeatable() {
        let store = Arc::new(InMemoryPartitionStore::new());
        let transport = online_transport()
            .with_failure("https://cdn.jsdelivr.net/npm/bootstrap.min.css", "unreachable");
        let mut host = MockHostController::new();
        host.expect_skip_waiting().never();

        let manager = manager(store.clone(), transport, host);

        let first = manager.install().await.unwrap_err();
        assert_eq!(manager.state(), LifecycleState::Uninstalled);
        assert!(store.list_names().await.unwrap().is_empty());

        let second = manager.install().await.unwrap_err();
        assert_eq!(manager.state(), LifecycleState::Uninstalled);
        assert!(store.list_names().await.unwrap().is_empty());

        assert!(matches!(first, DomainError::Provisioning { .. }));
        assert_eq!(first.to_string(), second.to_string());
    }

    #[tokio::test]
    async fn test_install_rejects_error_status() {
        let store = Arc::new(InMemoryPartitionStore::new());
        let transport = online_transport().with_response(
            "http://app.local/static/logo.png",
            ResponseSnapshot::new(404),
        );

        let manager = manager(store.clone(), transport, permissive_host());
        let error = manager.install().await.unwrap_err();

        assert_eq!(
            error.to_string(),
            "Provisioning failed for 'http://app.local/static/logo.png': HTTP 404"
        );
        assert!(store.list_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_rolls_back_new_partition_on_write_failure() {
        let store = Arc::new(MockPartitionStore::new().failing_on(FailOn::Put));

        let manager = manager(store.clone(), online_transport(), permissive_host());
        let error = manager.install().await.unwrap_err();

        assert!(matches!(error, DomainError::Storage { .. }));
        assert!(store.list_names().await.unwrap().is_empty());
        assert_eq!(manager.state(), LifecycleState::Uninstalled);
    }

    #[tokio::test]
    async fn test_install_keeps_preexisting_partition_on_write_failure() {
        let shell = RequestKey::for_url(&Url::parse("http://app.local/").unwrap());
        let store = Arc::new(
            MockPartitionStore::new()
                .with_entry("app-static-v2", shell.clone(), ok("previous shell"))
                .failing_on(FailOn::Put),
        );

        let manager = manager(store.clone(), online_transport(), permissive_host());
        assert!(manager.install().await.is_err());

        assert_eq!(store.list_names().await.unwrap(), vec!["app-static-v2"]);
        let kept = store
            .match_entry(&shell, Some("app-static-v2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.body().as_ref(), b"previous shell");
    }

    #[tokio::test]
    async fn test_install_twice_after_success_is_rejected() {
        let store = Arc::new(InMemoryPartitionStore::new());
        let manager = manager(store, online_transport(), permissive_host());

        manager.install().await.unwrap();
        let error = manager.install().await.unwrap_err();

        assert!(matches!(error, DomainError::Lifecycle { .. }));
        assert_eq!(manager.state(), LifecycleState::Ready);
    }

    #[tokio::test]
    async fn test_activate_deletes_every_stale_partition() {
        let store = Arc::new(InMemoryPartitionStore::new());
        for name in ["app-static-v1", "app-dynamic-v1", "app-static-v2", "app-dynamic-v2"] {
            store.open(name).await.unwrap();
        }
        let mut host = MockHostController::new();
        host.expect_skip_waiting().returning(|| Ok(()));
        host.expect_claim_active_sessions().times(1).returning(|| Ok(()));

        let manager = manager(store.clone(), online_transport(), host);
        manager.install().await.unwrap();
        let report = manager.activate().await.unwrap();

        assert!(manager.is_active());
        assert_eq!(report.deleted, vec!["app-static-v1", "app-dynamic-v1"]);
        assert_eq!(
            store.list_names().await.unwrap(),
            vec!["app-static-v2", "app-dynamic-v2"]
        );
    }

    #[tokio::test]
    async fn test_activate_removes_foreign_partitions() {
        let store = Arc::new(InMemoryPartitionStore::new());
        store.open("fastag-v1.0.0").await.unwrap();

        let manager = manager(store.clone(), online_transport(), permissive_host());
        manager.install().await.unwrap();
        let report = manager.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["fastag-v1.0.0"]);
        assert_eq!(report.retained, vec!["app-static-v2"]);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let store = Arc::new(InMemoryPartitionStore::new());
        let mut host = MockHostController::new();
        host.expect_claim_active_sessions().never();

        let manager = manager(store, online_transport(), host);
        let error = manager.activate().await.unwrap_err();

        assert!(matches!(error, DomainError::Lifecycle { .. }));
        assert_eq!(manager.state(), LifecycleState::Uninstalled);
    }

    #[tokio::test]
    async fn test_activate_failure_returns_to_ready() {
        let store = Arc::new(
            MockPartitionStore::new()
                .with_partition("app-static-v1")
                .failing_on(FailOn::Delete),
        );
        let mut host = MockHostController::new();
        host.expect_skip_waiting().returning(|| Ok(()));
        host.expect_claim_active_sessions().never();

        let manager = manager(store, online_transport(), host);
        manager.install().await.unwrap();
        let error = manager.activate().await.unwrap_err();

        assert!(matches!(error, DomainError::Storage { .. }));
        assert_eq!(manager.state(), LifecycleState::Ready);
    }

    #[tokio::test]
    async fn test_subscribe_observes_transitions() {
        let store = Arc::new(InMemoryPartitionStore::new());
        let manager = manager(store, online_transport(), permissive_host());
        let mut states = manager.subscribe();

        manager.install().await.unwrap();
        manager.activate().await.unwrap();

        states.changed().await.unwrap();
        assert_eq!(*states.borrow(), LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_supersede_active_instance() {
        let store = Arc::new(InMemoryPartitionStore::new());
        let manager = manager(store, online_transport(), permissive_host());

        manager.install().await.unwrap();
        manager.activate().await.unwrap();
        manager.supersede().unwrap();

        assert_eq!(manager.state(), LifecycleState::Redundant);
        assert!(manager.install().await.is_err());
    }
}
