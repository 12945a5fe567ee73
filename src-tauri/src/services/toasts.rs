//! Live toast presentation state.
//!
//! Each notification pushed over the live channel spawns an independent,
//! dismissable toast. Toasts auto-dismiss after six seconds; any dismissal
//! first marks the toast as exiting and removes it ~300ms later so the UI
//! can play its exit animation.
//!
//! The live channel delivers at-least-once: the same notification can show
//! up again on the next poll-driven refetch. A bounded set of recently seen
//! identifiers suppresses duplicate toasts.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{EventKind, PersonalNotification};
use crate::services::events::{EventSender, NotificationEvent};

/// How long a toast stays on screen before auto-dismissing.
pub const TOAST_AUTO_DISMISS: Duration = Duration::from_secs(6);

/// Grace period between dismissal and removal, for the exit animation.
pub const TOAST_EXIT_ANIMATION: Duration = Duration::from_millis(300);

/// How many recently-seen notification ids to remember for dedup.
const SEEN_CAPACITY: usize = 64;

/// One ephemeral toast popup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_kind: Option<EventKind>,

    pub created_at: DateTime<Utc>,

    /// True once dismissal started; the toast is removed shortly after.
    pub dismissing: bool,
}

impl From<&PersonalNotification> for Toast {
    fn from(n: &PersonalNotification) -> Self {
        Self {
            id: n.id,
            title: None,
            message: n.message.clone(),
            event_kind: Some(n.event_kind),
            created_at: n.created_at,
            dismissing: false,
        }
    }
}

#[derive(Default)]
struct ToastList {
    toasts: Vec<Toast>,
    seen: VecDeque<Uuid>,
}

impl ToastList {
    fn remember(&mut self, id: Uuid) -> bool {
        if self.seen.contains(&id) {
            return false;
        }
        if self.seen.len() == SEEN_CAPACITY {
            self.seen.pop_front();
        }
        self.seen.push_back(id);
        true
    }
}

/// Owns the live toast list and its dismissal timers.
#[derive(Clone)]
pub struct ToastManager {
    inner: Arc<RwLock<ToastList>>,
    events: EventSender,
}

impl ToastManager {
    pub fn new(events: EventSender) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ToastList::default())),
            events,
        }
    }

    /// Add a toast and schedule its auto-dismiss.
    ///
    /// Returns false when the notification id was seen recently and the
    /// toast was suppressed as a duplicate.
    pub async fn push(&self, toast: Toast) -> bool {
        let id = toast.id;

        {
            let mut list = self.inner.write().await;
            if !list.remember(id) {
                log::debug!("Suppressed duplicate toast {}", id);
                return false;
            }
            list.toasts.push(toast);
        }
        self.publish().await;

        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(TOAST_AUTO_DISMISS).await;
            manager.dismiss(id).await;
        });

        true
    }

    /// Begin dismissing a toast.
    ///
    /// Idempotent: dismissing an unknown or already-exiting toast is a
    /// no-op, so a user dismissal and the auto-dismiss timer can race
    /// safely. Removal happens after the exit-animation grace period.
    pub async fn dismiss(&self, id: Uuid) {
        {
            let mut list = self.inner.write().await;
            match list.toasts.iter_mut().find(|t| t.id == id && !t.dismissing) {
                Some(toast) => toast.dismissing = true,
                None => return,
            }
        }
        self.publish().await;

        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(TOAST_EXIT_ANIMATION).await;
            manager.remove(id).await;
        });
    }

    /// Snapshot of the toasts currently on screen.
    pub async fn active(&self) -> Vec<Toast> {
        self.inner.read().await.toasts.clone()
    }

    async fn remove(&self, id: Uuid) {
        {
            let mut list = self.inner.write().await;
            let before = list.toasts.len();
            list.toasts.retain(|t| t.id != id);
            if list.toasts.len() == before {
                return;
            }
        }
        self.publish().await;
    }

    async fn publish(&self) {
        let toasts = self.active().await;
        let _ = self.events.send(NotificationEvent::ToastsChanged { toasts });
    }
}
