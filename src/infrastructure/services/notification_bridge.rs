//! Push messages, notification clicks and background sync

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::DomainError;
use crate::domain::host::{HostController, Notification};
use crate::domain::worker::{NotificationClick, PushOutcome, SyncOutcome};
use crate::infrastructure::observability::record_push;

/// Notification settings
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Icon and badge applied to messaging-envelope pushes
    #[serde(default = "default_icon")]
    pub default_icon: Option<String>,
    #[serde(default = "default_messaging_tag")]
    pub messaging_tag: Option<String>,
    #[serde(default)]
    pub web_push_tag: Option<String>,
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,
    /// Opened when a clicked notification carries no URL
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_icon() -> Option<String> {
    Some("/static/icons/icon-192x192.png".to_string())
}

fn default_messaging_tag() -> Option<String> {
    Some("onebee-notification".to_string())
}

fn default_sync_tag() -> String {
    "background-sync".to_string()
}

fn default_scope() -> String {
    "/".to_string()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_icon: default_icon(),
            messaging_tag: default_messaging_tag(),
            web_push_tag: None,
            sync_tag: default_sync_tag(),
            scope: default_scope(),
        }
    }
}

/// Push payload as sent by either the web-push service or the messaging service
#[derive(Debug, Default, Deserialize)]
struct RawPushPayload {
    title: Option<String>,
    body: Option<String>,
    icon: Option<String>,
    url: Option<String>,
    notification: Option<MessagingNotification>,
    data: Option<MessagingData>,
}

#[derive(Debug, Default, Deserialize)]
struct MessagingNotification {
    title: Option<String>,
    body: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MessagingData {
    url: Option<String>,
}

/// Turns push payloads into native notifications and routes clicks back to a window
#[derive(Debug)]
pub struct NotificationBridge {
    config: NotificationConfig,
    host: Arc<dyn HostController>,
}

impl NotificationBridge {
    pub fn new(config: NotificationConfig, host: Arc<dyn HostController>) -> Self {
        Self { config, host }
    }

    /// Displays the notification a push payload describes
    ///
    /// Never fails: malformed payloads and host errors are logged and the push is skipped.
    #[instrument(skip(self, raw), fields(bytes = raw.len()))]
    pub async fn on_push_received(&self, raw: &[u8]) -> PushOutcome {
        let outcome = match self.parse(raw) {
            Ok(notification) => self.display(notification).await,
            Err(e) => {
                warn!(error = %e, "Skipping malformed push payload");
                PushOutcome::Skipped(e.to_string())
            }
        };

        record_push(&outcome);
        outcome
    }

    /// Closes the clicked notification, then focuses or opens its target
    #[instrument(skip(self), fields(notification_id = %click.notification_id))]
    pub async fn on_notification_activated(
        &self,
        click: NotificationClick,
    ) -> Result<(), DomainError> {
        self.host.close_notification(&click.notification_id).await?;

        let target = click
            .url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.config.scope.clone());

        info!(url = %target, "Opening notification target");
        self.host.focus_or_open_window(&target).await
    }

    pub async fn on_sync(&self, tag: &str) -> SyncOutcome {
        if tag != self.config.sync_tag {
            debug!(tag = %tag, "Ignoring unknown sync tag");
            return SyncOutcome::Ignored;
        }

        // Nothing is queued offline yet; the hook only marks the registration done
        info!(tag = %tag, "Performing background sync");
        SyncOutcome::Completed
    }

    fn parse(&self, raw: &[u8]) -> Result<Notification, DomainError> {
        let payload: RawPushPayload = serde_json::from_slice(raw)
            .map_err(|e| DomainError::malformed_payload(format!("Invalid JSON: {}", e)))?;

        match payload.notification {
            Some(envelope) => {
                let title = require_title(envelope.title)?;
                let url = payload.data.and_then(|data| data.url);
                let icon = envelope.icon.or_else(|| self.config.default_icon.clone());

                Ok(Notification::new(title, envelope.body.unwrap_or_default())
                    .with_icon(icon)
                    .with_badge(self.config.default_icon.clone())
                    .with_tag(self.config.messaging_tag.clone())
                    .with_url(url))
            }
            None => {
                let title = require_title(payload.title)?;
                let url = payload.url.or_else(|| payload.data.and_then(|data| data.url));

                Ok(Notification::new(title, payload.body.unwrap_or_default())
                    .with_icon(payload.icon)
                    .with_tag(self.config.web_push_tag.clone())
                    .with_url(url))
            }
        }
    }

    async fn display(&self, notification: Notification) -> PushOutcome {
        match self.host.show_notification(notification).await {
            Ok(()) => PushOutcome::Displayed,
            Err(e) => {
                warn!(error = %e, "Host failed to display notification");
                PushOutcome::Skipped(e.to_string())
            }
        }
    }
}

fn require_title(title: Option<String>) -> Result<String, DomainError> {
    title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| DomainError::malformed_payload("Push payload has no title"))
}
