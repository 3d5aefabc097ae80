//! Transient push tier of the notification model.
//!
//! The hub is owned by `AppState` and injected where needed. Each WebSocket
//! connection registers a [`RealtimeSession`]; dropping the session (socket
//! closed, user logged out) deregisters it. Publishing never blocks: a session
//! whose buffer is full simply misses the event and can catch up through the
//! stored notifications.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::notification::NotificationKind;

const SESSION_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub event: NotificationKind,
    pub message: String,
    pub notification_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

struct SessionHandle {
    id: u64,
    tx: mpsc::Sender<RealtimeEvent>,
}

#[derive(Default)]
struct HubInner {
    sessions: Mutex<HashMap<Uuid, Vec<SessionHandle>>>,
    next_id: AtomicU64,
}

impl HubInner {
    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, Vec<SessionHandle>>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, user_id: Uuid, session_id: u64) {
        let mut sessions = self.sessions();
        if let Some(handles) = sessions.get_mut(&user_id) {
            handles.retain(|h| h.id != session_id);
            if handles.is_empty() {
                sessions.remove(&user_id);
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct RealtimeHub {
    inner: Arc<HubInner>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, user_id: Uuid) -> RealtimeSession {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.inner
            .sessions()
            .entry(user_id)
            .or_default()
            .push(SessionHandle { id, tx });
        tracing::debug!(%user_id, session_id = id, "realtime session opened");

        RealtimeSession {
            user_id,
            id,
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Pushes `event` to every live session of `user_id` and returns how many
    /// sessions accepted it.
    pub fn publish(&self, user_id: Uuid, event: RealtimeEvent) -> usize {
        let mut sessions = self.inner.sessions();
        let Some(handles) = sessions.get_mut(&user_id) else {
            return 0;
        };

        let mut delivered = 0;
        handles.retain(|handle| match handle.tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(%user_id, session_id = handle.id, "realtime session buffer full, event dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        if handles.is_empty() {
            sessions.remove(&user_id);
        }
        delivered
    }

    pub fn session_count(&self, user_id: Uuid) -> usize {
        self.inner
            .sessions()
            .get(&user_id)
            .map_or(0, |handles| handles.len())
    }
}

pub struct RealtimeSession {
    user_id: Uuid,
    id: u64,
    rx: mpsc::Receiver<RealtimeEvent>,
    hub: Weak<HubInner>,
}

impl RealtimeSession {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.rx.recv().await
    }
}

impl Drop for RealtimeSession {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            inner.remove(self.user_id, self.id);
            tracing::debug!(user_id = %self.user_id, session_id = self.id, "realtime session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(message: &str) -> RealtimeEvent {
        RealtimeEvent {
            event: NotificationKind::StageProgress,
            message: message.to_string(),
            notification_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn delivers_to_every_session_of_the_recipient() {
        let hub = RealtimeHub::new();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut first = hub.connect(user);
        let mut second = hub.connect(user);
        let _bystander = hub.connect(other);

        assert_eq!(hub.publish(user, event("moved")), 2);
        assert_eq!(first.recv().await.unwrap().message, "moved");
        assert_eq!(second.recv().await.unwrap().message, "moved");
    }

    #[tokio::test]
    async fn dropping_a_session_deregisters_it() {
        let hub = RealtimeHub::new();
        let user = Uuid::new_v4();
        let session = hub.connect(user);
        assert_eq!(hub.session_count(user), 1);
        drop(session);
        assert_eq!(hub.session_count(user), 0);
        assert_eq!(hub.publish(user, event("missed")), 0);
    }

    #[tokio::test]
    async fn full_buffer_drops_instead_of_blocking() {
        let hub = RealtimeHub::new();
        let user = Uuid::new_v4();
        let mut session = hub.connect(user);
        for i in 0..SESSION_BUFFER {
            assert_eq!(hub.publish(user, event(&i.to_string())), 1);
        }
        assert_eq!(hub.publish(user, event("overflow")), 0);
        assert_eq!(session.recv().await.unwrap().message, "0");
    }
}
