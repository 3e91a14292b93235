//! Request and response bodies of the control API

use serde::{Deserialize, Serialize};

use crate::domain::worker::{LifecycleState, SyncOutcome, WorkerEvents};
use crate::infrastructure::services::ServiceWorker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub version: String,
    pub state: LifecycleState,
}

impl From<&ServiceWorker> for WorkerInfo {
    fn from(worker: &ServiceWorker) -> Self {
        Self {
            version: worker.version().to_string(),
            state: worker.state(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<WorkerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<WorkerInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionsResponse {
    pub partitions: Vec<String>,
    /// Partitions owned by the active worker's version
    pub current: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncRequest {
    pub tag: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse {
    pub tag: String,
    pub outcome: SyncOutcome,
}
