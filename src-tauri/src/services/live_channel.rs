//! Live notification channel.
//!
//! Maintains a best-effort WebSocket stream of personal notifications for
//! the authenticated user. The connection loop runs as a background task
//! owned by a `LiveChannelHandle`; teardown cancels the socket and any
//! pending reconnection deterministically, so no stale reconnect can fire
//! after the owner stops the channel.
//!
//! Reconnection uses a linear backoff (`attempt x 2s`) with a ceiling of
//! three consecutive closes. A successful open resets the counter. Once
//! the ceiling is hit the channel goes terminally `Failed` and the only
//! user-visible symptom is the absence of live updates.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::PersonalNotification;
use crate::services::events::{EventSender, NotificationEvent};
use crate::services::toasts::{Toast, ToastManager};

/// Fixed production live channel endpoint.
pub const DEFAULT_LIVE_ENDPOINT: &str = "wss://api.agropec.com.br/ws";

/// State of the live channel, reported to the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveChannelState {
    /// No connection and none wanted (initial, or after teardown).
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Connected; messages flow.
    Open,
    /// Closed; a reconnect is pending.
    Reconnecting { attempt: u32 },
    /// Retry ceiling reached; terminal.
    Failed,
}

/// Reconnection policy: linear backoff with a fixed ceiling.
///
/// Injectable so tests can shrink the delays.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Maximum consecutive closes before giving up.
    pub max_attempts: u32,

    /// Backoff unit; the nth consecutive close waits `n x base_delay`.
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the nth reconnection attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Live channel configuration.
#[derive(Debug, Clone)]
pub struct LiveChannelConfig {
    /// WebSocket endpoint, without the token.
    pub endpoint: String,

    /// Session token, embedded as a query parameter on connect.
    pub token: String,

    pub policy: ReconnectPolicy,
}

impl LiveChannelConfig {
    /// Config for the fixed production endpoint.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_LIVE_ENDPOINT.to_string(),
            token: token.into(),
            policy: ReconnectPolicy::default(),
        }
    }

    /// Full connection URL with the token as a query parameter.
    pub fn url(&self) -> String {
        format!(
            "{}?token={}",
            self.endpoint,
            urlencoding::encode(&self.token)
        )
    }
}

/// Lightweight handle for observing and tearing down the live channel.
///
/// Managed as part of the app runtime. Dropping the handle does not stop
/// the channel; call [`LiveChannelHandle::stop`].
#[derive(Clone)]
pub struct LiveChannelHandle {
    cancel: CancellationToken,
    state: Arc<RwLock<LiveChannelState>>,
}

impl LiveChannelHandle {
    /// Tear the channel down: close the socket if open and cancel any
    /// pending reconnection.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether teardown has been requested.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Current connection state.
    pub async fn state(&self) -> LiveChannelState {
        *self.state.read().await
    }
}

/// The live channel connection loop.
pub struct LiveChannel;

impl LiveChannel {
    /// Spawn the connection loop and return its handle.
    ///
    /// Incoming notifications are pushed to the toast manager and reported
    /// on the event channel, together with every state transition.
    pub fn start(
        config: LiveChannelConfig,
        events: EventSender,
        toasts: ToastManager,
    ) -> LiveChannelHandle {
        let cancel = CancellationToken::new();
        let state = Arc::new(RwLock::new(LiveChannelState::Idle));

        let handle = LiveChannelHandle {
            cancel: cancel.clone(),
            state: state.clone(),
        };

        tokio::spawn(run_channel(config, events, toasts, cancel, state));

        handle
    }
}

async fn set_state(
    slot: &Arc<RwLock<LiveChannelState>>,
    events: &EventSender,
    next: LiveChannelState,
) {
    *slot.write().await = next;
    if next == LiveChannelState::Open {
        let _ = events.send(NotificationEvent::ChannelOpened);
    }
}

async fn run_channel(
    config: LiveChannelConfig,
    events: EventSender,
    toasts: ToastManager,
    cancel: CancellationToken,
    state: Arc<RwLock<LiveChannelState>>,
) {
    let url = config.url();
    // Consecutive closes since the last successful open.
    let mut attempts: u32 = 0;

    loop {
        if attempts == 0 {
            set_state(&state, &events, LiveChannelState::Connecting).await;
        }

        let connected = tokio::select! {
            _ = cancel.cancelled() => {
                set_state(&state, &events, LiveChannelState::Idle).await;
                return;
            }
            result = connect_async(url.as_str()) => match result {
                Ok((ws, _)) => Some(ws),
                Err(e) => {
                    log::warn!("Live channel connect failed: {}", e);
                    None
                }
            },
        };

        if let Some(mut ws) = connected {
            attempts = 0;
            set_state(&state, &events, LiveChannelState::Open).await;
            log::info!("Live channel open");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = ws.close(None).await;
                        set_state(&state, &events, LiveChannelState::Idle).await;
                        return;
                    }
                    message = ws.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            handle_message(text.as_str(), &events, &toasts).await;
                        }
                        // Control frames are transport noise
                        Some(Ok(Message::Ping(_)))
                        | Some(Ok(Message::Pong(_)))
                        | Some(Ok(Message::Binary(_)))
                        | Some(Ok(Message::Frame(_))) => {}
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            // Errors are logged only; the close that follows
                            // drives reconnection.
                            log::warn!("Live channel error: {}", e);
                            break;
                        }
                    }
                }
            }
            log::info!("Live channel closed");
        }

        if attempts >= config.policy.max_attempts {
            set_state(&state, &events, LiveChannelState::Failed).await;
            let _ = events.send(NotificationEvent::RetryExhausted { attempts });
            log::warn!(
                "Live channel gave up after {} reconnection attempts",
                attempts
            );
            return;
        }

        attempts += 1;
        // The polled state must already say "reconnect pending" while the
        // backoff sleep runs, not just once the next attempt starts.
        set_state(
            &state,
            &events,
            LiveChannelState::Reconnecting { attempt: attempts },
        )
        .await;
        let delay = config.policy.delay_for(attempts);
        let _ = events.send(NotificationEvent::ChannelClosed {
            attempt: attempts,
            retry_in_ms: Some(delay.as_millis() as u64),
        });

        // The pending reconnect races teardown, so stopping the channel
        // while a reconnect is scheduled never produces a stray attempt.
        tokio::select! {
            _ = cancel.cancelled() => {
                set_state(&state, &events, LiveChannelState::Idle).await;
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Handle one inbound text frame. Malformed payloads are discarded; the
/// channel stays open.
async fn handle_message(text: &str, events: &EventSender, toasts: &ToastManager) {
    match decode_push_payload(text) {
        Ok(notification) => {
            toasts.push(Toast::from(&notification)).await;
            let _ = events.send(NotificationEvent::NotificationReceived {
                notification,
            });
            let _ = events.send(NotificationEvent::FeedInvalidated);
        }
        Err(e) => {
            log::warn!("Discarding malformed push payload: {}", e);
            let _ = events.send(NotificationEvent::ParseFailure {
                detail: e.to_string(),
            });
        }
    }
}

/// Decode an inbound push payload.
///
/// The current wire format is the tagged envelope
/// `{"type": "notification", "data": {...}}`. Legacy senders still emit a
/// bare object whose identifier is carried under `uuid`; that translation
/// is confined to this one function so nothing past the transport boundary
/// deals with untagged payloads.
pub(crate) fn decode_push_payload(text: &str) -> Result<PersonalNotification, AppError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| AppError::invalid_input(format!("not valid JSON: {}", e)))?;

    if value.get("type").and_then(|t| t.as_str()) == Some("notification") {
        let data = value
            .get("data")
            .cloned()
            .ok_or_else(|| AppError::invalid_input_field("missing payload data", "data"))?;
        return serde_json::from_value(data)
            .map_err(|e| AppError::invalid_input(format!("bad notification payload: {}", e)));
    }

    if value.get("uuid").is_some() {
        // Legacy untagged payload
        return serde_json::from_value(value)
            .map_err(|e| AppError::invalid_input(format!("bad legacy payload: {}", e)));
    }

    Err(AppError::invalid_input("unrecognized push payload shape"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeliveryStatus, EventKind};

    #[test]
    fn test_reconnect_delays_are_linear() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(6000));
    }

    #[test]
    fn test_url_embeds_encoded_token() {
        let config = LiveChannelConfig::new("abc/+=123");
        assert_eq!(
            config.url(),
            format!("{}?token=abc%2F%2B%3D123", DEFAULT_LIVE_ENDPOINT)
        );
    }

    #[test]
    fn test_decode_tagged_envelope() {
        let text = r#"{
            "type": "notification",
            "data": {
                "id": "8f14e45f-ceea-467f-a8cf-95d1e0a8e9a1",
                "userId": "user-1",
                "message": "Milking contest starts in 10 minutes",
                "eventId": "6c8a2b11-05a0-43d8-9f71-2e5b1b1f3c77",
                "eventKind": "activity",
                "status": "delivered",
                "createdAt": "2024-08-01T12:00:00Z"
            }
        }"#;

        let n = decode_push_payload(text).unwrap();
        assert_eq!(n.user_id, "user-1");
        assert_eq!(n.event_kind, EventKind::Activity);
    }

    #[test]
    fn test_decode_legacy_bare_uuid_payload() {
        let text = r#"{
            "uuid": "8f14e45f-ceea-467f-a8cf-95d1e0a8e9a1",
            "userId": "user-1",
            "message": "Your stand visit is due",
            "eventId": "6c8a2b11-05a0-43d8-9f71-2e5b1b1f3c77",
            "eventKind": "stand",
            "status": "pending",
            "createdAt": "2024-08-01T12:00:00Z"
        }"#;

        let n = decode_push_payload(text).unwrap();
        assert_eq!(n.event_kind, EventKind::Stand);
        assert_eq!(n.status, DeliveryStatus::Pending);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_push_payload("{not json").is_err());
        assert!(decode_push_payload("42").is_err());
        assert!(decode_push_payload(r#"{"type": "heartbeat"}"#).is_err());
        // Tagged but with a broken body
        assert!(decode_push_payload(r#"{"type": "notification", "data": {"id": 1}}"#).is_err());
        assert!(decode_push_payload(r#"{"type": "notification"}"#).is_err());
    }
}
