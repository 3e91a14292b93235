//! Host controller that publishes host events to subscribers

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::domain::DomainError;
use crate::domain::host::{HostController, HostEvent, Notification};

/// Host controller for a headless gateway
///
/// Notifications and window requests are published on a broadcast channel; the control
/// API streams them to whichever client surface renders them. Open notifications are
/// tracked so a tagged notification replaces its predecessor.
#[derive(Debug)]
pub struct BroadcastHostController {
    sender: broadcast::Sender<HostEvent>,
    open: Mutex<Vec<Notification>>,
}

impl BroadcastHostController {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            open: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.sender.subscribe()
    }

    /// Notifications currently displayed
    pub fn open_notifications(&self) -> Vec<Notification> {
        self.open
            .lock()
            .map(|open| open.clone())
            .unwrap_or_default()
    }

    fn publish(&self, event: HostEvent) {
        // No subscribers is fine: events are advisory
        if self.sender.send(event).is_err() {
            debug!("Host event dropped, no subscribers");
        }
    }
}

impl Default for BroadcastHostController {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl HostController for BroadcastHostController {
    async fn show_notification(&self, notification: Notification) -> Result<(), DomainError> {
        {
            let mut open = self
                .open
                .lock()
                .map_err(|_| DomainError::host("Notification registry lock poisoned"))?;

            if let Some(tag) = &notification.tag {
                open.retain(|existing| existing.tag.as_ref() != Some(tag));
            }
            open.push(notification.clone());
        }

        info!(
            notification_id = %notification.id,
            title = %notification.title,
            tag = ?notification.tag,
            "Notification shown"
        );
        self.publish(HostEvent::NotificationShown { notification });
        Ok(())
    }

    async fn close_notification(&self, id: &str) -> Result<(), DomainError> {
        self.open
            .lock()
            .map_err(|_| DomainError::host("Notification registry lock poisoned"))?
            .retain(|existing| existing.id != id);

        self.publish(HostEvent::NotificationClosed { id: id.to_string() });
        Ok(())
    }

    async fn focus_or_open_window(&self, url: &str) -> Result<(), DomainError> {
        info!(url = %url, "Focusing window");
        self.publish(HostEvent::WindowFocused {
            url: url.to_string(),
        });
        Ok(())
    }

    async fn claim_active_sessions(&self) -> Result<(), DomainError> {
        self.publish(HostEvent::SessionsClaimed);
        Ok(())
    }

    async fn skip_waiting(&self) -> Result<(), DomainError> {
        self.publish(HostEvent::SkipWaiting);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tagged_notification_replaces_previous() {
        let host = BroadcastHostController::default();

        let first = Notification::new("Lane 1", "Vehicle passed").with_tag(Some("lanes".into()));
        let second = Notification::new("Lane 1", "Another vehicle").with_tag(Some("lanes".into()));

        host.show_notification(first).await.unwrap();
        host.show_notification(second.clone()).await.unwrap();

        assert_eq!(host.open_notifications(), vec![second]);
    }

    #[tokio::test]
    async fn test_untagged_notifications_stack() {
        let host = BroadcastHostController::default();

        host.show_notification(Notification::new("a", "1")).await.unwrap();
        host.show_notification(Notification::new("b", "2")).await.unwrap();

        assert_eq!(host.open_notifications().len(), 2);
    }

    #[tokio::test]
    async fn test_close_removes_and_publishes() {
        let host = BroadcastHostController::default();
        let mut events = host.subscribe();

        let notification = Notification::new("a", "1");
        let id = notification.id.clone();
        host.show_notification(notification).await.unwrap();
        host.close_notification(&id).await.unwrap();

        assert!(host.open_notifications().is_empty());
        assert!(matches!(
            events.recv().await.unwrap(),
            HostEvent::NotificationShown { .. }
        ));
        assert_eq!(
            events.recv().await.unwrap(),
            HostEvent::NotificationClosed { id }
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let host = BroadcastHostController::default();

        assert!(host.claim_active_sessions().await.is_ok());
        assert!(host.skip_waiting().await.is_ok());
    }
}
