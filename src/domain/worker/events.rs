//! Worker event dispatch interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::lifecycle::LifecycleState;
use crate::domain::DomainError;
use crate::domain::exchange::{ProxyRequest, ProxyResponse};

/// What the worker decided to do with an intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The worker produced the response
    Respond(ProxyResponse),
    /// Not intercepted; the host performs its default network behavior unmodified
    PassThrough,
}

impl FetchOutcome {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, FetchOutcome::PassThrough)
    }
}

/// Result of an activation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub deleted: Vec<String>,
    pub retained: Vec<String>,
}

/// Result of handling a push message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum PushOutcome {
    Displayed,
    Skipped(String),
}

/// Result of a background sync event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed,
    Ignored,
}

/// A click on a notification previously shown by the worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationClick {
    pub notification_id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// One method per event kind the host dispatches to the worker
#[async_trait]
pub trait WorkerEvents: Send + Sync {
    /// Provisioning phase
    async fn install(&self) -> Result<(), DomainError>;

    /// Activation phase: retire stale partitions and claim sessions
    async fn activate(&self) -> Result<ActivationReport, DomainError>;

    /// An intercepted request
    async fn fetch(&self, request: &ProxyRequest) -> FetchOutcome;

    /// An opaque push payload from the messaging service
    async fn push(&self, payload: &[u8]) -> PushOutcome;

    /// A notification was activated by the user
    async fn notification_click(&self, click: NotificationClick) -> Result<(), DomainError>;

    /// A background sync registration fired
    async fn sync(&self, tag: &str) -> SyncOutcome;

    /// Current lifecycle state
    fn state(&self) -> LifecycleState;
}
