//! Structured notification-subsystem events.
//!
//! Services publish these into an unbounded channel instead of logging to
//! the console; the Tauri layer forwards them to the webview so the UI can
//! reactively update. Integration tests subscribe to the same channel
//! directly, without a Tauri runtime.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::PersonalNotification;
use crate::services::toasts::Toast;

/// Event: live-channel-state
/// Emitted on every live channel state transition.
pub const LIVE_CHANNEL_STATE_EVENT: &str = "live-channel-state";

/// Event: notification-received
/// Emitted when the live channel delivers a new personal notification.
pub const NOTIFICATION_RECEIVED_EVENT: &str = "notification-received";

/// Event: feed-invalidated
/// Emitted when the cached aggregate feed should be refetched.
pub const FEED_INVALIDATED_EVENT: &str = "feed-invalidated";

/// Event: badge-updated
/// Emitted when the unread count has been recomputed.
pub const BADGE_UPDATED_EVENT: &str = "badge-updated";

/// Event: toasts-changed
/// Emitted whenever the live toast list changes.
pub const TOASTS_CHANGED_EVENT: &str = "toasts-changed";

/// Event: fetch-failed
/// Emitted when a background fetch degrades (badge goes stale).
pub const FETCH_FAILED_EVENT: &str = "fetch-failed";

/// Sender half used by every service that reports events.
pub type EventSender = mpsc::UnboundedSender<NotificationEvent>;

/// Receiver half, consumed by the Tauri forwarder (or by tests).
pub type EventReceiver = mpsc::UnboundedReceiver<NotificationEvent>;

/// Create the event channel.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// One observability event from the notification subsystem.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// The live channel finished its handshake.
    ChannelOpened,

    /// The live channel closed; a reconnect is scheduled unless the retry
    /// ceiling was hit (then `RetryExhausted` follows instead).
    ChannelClosed {
        /// Consecutive close count since the last successful open.
        attempt: u32,
        /// Delay before the scheduled reconnect, if one was scheduled.
        retry_in_ms: Option<u64>,
    },

    /// The retry ceiling was reached; the channel is terminally failed.
    RetryExhausted { attempts: u32 },

    /// An inbound push payload could not be decoded. The message was
    /// discarded; the channel stays open.
    ParseFailure { detail: String },

    /// A new personal notification arrived over the live channel.
    NotificationReceived {
        notification: PersonalNotification,
    },

    /// Consumers should refetch the aggregate feed.
    FeedInvalidated,

    /// The unread badge count was recomputed.
    BadgeUpdated { unread: usize },

    /// A background fetch failed; the badge simply stops updating.
    FetchFailed { message: String },

    /// The live toast list changed (push, dismiss begin, or removal).
    ToastsChanged { toasts: Vec<Toast> },
}
