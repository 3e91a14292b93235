//! Host domain - the capabilities the embedding environment lends to the worker

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// A native notification as handed to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    /// Notifications sharing a tag replace each other instead of stacking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Navigation target when the notification is activated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub require_interaction: bool,
    pub silent: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            icon: None,
            badge: None,
            tag: None,
            url: None,
            require_interaction: false,
            silent: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_badge(mut self, badge: Option<String>) -> Self {
        self.badge = badge;
        self
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }
}

/// Something the host did on the worker's behalf
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    NotificationShown { notification: Notification },
    NotificationClosed { id: String },
    WindowFocused { url: String },
    SessionsClaimed,
    SkipWaiting,
}

/// Window, notification and session control supplied by the hosting environment
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HostController: Send + Sync + std::fmt::Debug {
    /// Displays a native notification
    async fn show_notification(&self, notification: Notification) -> Result<(), DomainError>;

    /// Dismisses a displayed notification
    async fn close_notification(&self, id: &str) -> Result<(), DomainError>;

    /// Focuses an existing window at `url` or opens a new one
    async fn focus_or_open_window(&self, url: &str) -> Result<(), DomainError>;

    /// Takes control of already-open client sessions
    async fn claim_active_sessions(&self) -> Result<(), DomainError>;

    /// Replaces any previously active instance without waiting for its sessions to close
    async fn skip_waiting(&self) -> Result<(), DomainError>;
}
