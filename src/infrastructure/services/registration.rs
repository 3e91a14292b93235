//! Version lineage: at most one active worker at a time

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::domain::DomainError;
use crate::domain::worker::{ActivationReport, WorkerEvents};

use super::service_worker::ServiceWorker;

/// Tracks the active worker and the one waiting to replace it
#[derive(Debug, Default)]
pub struct Registration {
    active: RwLock<Option<Arc<ServiceWorker>>>,
    pending: RwLock<Option<Arc<ServiceWorker>>>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a worker for installation, replacing any previously staged one
    pub fn register(&self, worker: ServiceWorker) -> Result<Arc<ServiceWorker>, DomainError> {
        let worker = Arc::new(worker);
        let previous = self.pending_slot()?.replace(worker.clone());

        if let Some(previous) = previous {
            info!(version = %previous.version(), "Discarding staged worker");
            if let Err(e) = previous.supersede() {
                debug!(
                    version = %previous.version(),
                    error = %e,
                    "Staged worker was not retired"
                );
            }
        }

        info!(version = %worker.version(), "Worker registered");
        Ok(worker)
    }

    pub fn active(&self) -> Option<Arc<ServiceWorker>> {
        self.active.read().ok().and_then(|slot| slot.clone())
    }

    pub fn pending(&self) -> Option<Arc<ServiceWorker>> {
        self.pending.read().ok().and_then(|slot| slot.clone())
    }

    /// Runs the provisioning phase of the staged worker
    pub async fn install_pending(&self) -> Result<(), DomainError> {
        let worker = self
            .pending()
            .ok_or_else(|| DomainError::lifecycle("No worker is waiting to install"))?;

        worker.install().await
    }

    /// Activates the staged worker and makes it the active one
    pub async fn activate_pending(&self) -> Result<ActivationReport, DomainError> {
        let worker = self
            .pending()
            .ok_or_else(|| DomainError::lifecycle("No worker is waiting to activate"))?;

        let report = worker.activate().await?;
        self.promote(worker.clone())?;

        let mut pending = self.pending_slot()?;
        if pending.as_ref().is_some_and(|staged| Arc::ptr_eq(staged, &worker)) {
            *pending = None;
        }

        Ok(report)
    }

    /// Swaps in an active worker and retires the one it replaces
    pub fn promote(&self, worker: Arc<ServiceWorker>) -> Result<(), DomainError> {
        if !worker.is_active() {
            return Err(DomainError::lifecycle(format!(
                "Worker {} is {}, only an active worker can be promoted",
                worker.version(),
                worker.state()
            )));
        }

        let previous = self
            .active
            .write()
            .map_err(|_| DomainError::internal("Registration lock poisoned"))?
            .replace(worker.clone());

        if let Some(previous) = previous.filter(|previous| !Arc::ptr_eq(previous, &worker)) {
            if let Err(e) = previous.supersede() {
                warn!(version = %previous.version(), error = %e, "Failed to retire previous worker");
            } else {
                info!(
                    previous = %previous.version(),
                    current = %worker.version(),
                    "Previous worker retired"
                );
            }
        }

        Ok(())
    }

    fn pending_slot(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, Option<Arc<ServiceWorker>>>, DomainError> {
        self.pending
            .write()
            .map_err(|_| DomainError::internal("Registration lock poisoned"))
    }
}
