use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::database::store::Store;
use crate::error::{Error, Result};
use crate::models::notification::{Notification, NotificationKind};
use crate::services::realtime_service::{RealtimeEvent, RealtimeHub};
use crate::utils::time;

/// Upper bound on the durable write inside a request. A stalled store costs
/// the caller at most this long; the live push still goes out.
pub const NOTIFICATION_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Two-tier notifications: a durable row per event plus a best-effort push
/// to the recipient's live sessions.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn Store>,
    hub: RealtimeHub,
}

impl NotificationService {
    pub fn new(store: Arc<dyn Store>, hub: RealtimeHub) -> Self {
        Self { store, hub }
    }

    /// Fire-and-forget. Failures are logged and swallowed so they can never
    /// undo the state change that triggered the notification.
    pub async fn emit(&self, recipient_id: Uuid, kind: NotificationKind, message: String) {
        let write = self
            .store
            .insert_notification(recipient_id, kind, message.clone());
        let stored = match tokio::time::timeout(NOTIFICATION_WRITE_TIMEOUT, write).await {
            Ok(Ok(notification)) => Some(notification),
            Ok(Err(err)) => {
                tracing::warn!(%recipient_id, ?kind, error = %err, "failed to store notification");
                None
            }
            Err(_) => {
                tracing::warn!(
                    %recipient_id,
                    ?kind,
                    timeout_ms = NOTIFICATION_WRITE_TIMEOUT.as_millis() as u64,
                    "notification write timed out"
                );
                None
            }
        };

        let event = RealtimeEvent {
            event: kind,
            message,
            notification_id: stored.as_ref().map(|n| n.id),
            created_at: stored.as_ref().map_or_else(time::now, |n| n.created_at),
        };
        let delivered = self.hub.publish(recipient_id, event);
        tracing::debug!(%recipient_id, ?kind, delivered, "notification emitted");
    }

    pub async fn list(&self, recipient_id: Uuid, unread_only: bool) -> Result<Vec<Notification>> {
        self.store.list_notifications(recipient_id, unread_only).await
    }

    pub async fn mark_read(&self, recipient_id: Uuid, id: Uuid) -> Result<Notification> {
        self.store
            .mark_notification_read(recipient_id, id)
            .await?
            .ok_or_else(|| Error::NotFound("Notification not found".to_string()))
    }

    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        self.store.mark_all_notifications_read(recipient_id).await
    }
}
