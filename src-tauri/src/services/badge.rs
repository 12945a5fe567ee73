//! Background badge refresher.
//!
//! Polls the unread count on a fixed interval and re-emits it on the event
//! channel so the frontend badge stays roughly current even when the live
//! channel is down. A fetch failure leaves the last known badge value in
//! place; the refresher never stops on errors.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::services::aggregator::NotificationAggregator;
use crate::services::events::{EventSender, NotificationEvent};

/// Default interval between unread count polls.
pub const BADGE_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug)]
enum BadgeCommand {
    /// Refresh now, off-schedule (after a mutation or a live push).
    Refresh,
    Stop,
}

/// Handle to the refresher task.
#[derive(Clone)]
pub struct BadgeHandle {
    tx: mpsc::Sender<BadgeCommand>,
}

impl BadgeHandle {
    /// Request an immediate off-schedule refresh.
    pub async fn refresh(&self) {
        let _ = self.tx.send(BadgeCommand::Refresh).await;
    }

    /// Stop the refresher task.
    pub async fn stop(&self) {
        let _ = self.tx.send(BadgeCommand::Stop).await;
    }
}

/// The badge polling loop.
pub struct BadgeRefresher;

impl BadgeRefresher {
    /// Spawn the polling loop and return its handle.
    ///
    /// The first poll happens immediately, then every `interval`.
    pub fn start(
        aggregator: Arc<NotificationAggregator>,
        user_id: String,
        events: EventSender,
        interval: Duration,
    ) -> BadgeHandle {
        let (tx, mut rx) = mpsc::channel(16);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        refresh_once(&aggregator, &user_id, &events).await;
                    }
                    command = rx.recv() => match command {
                        Some(BadgeCommand::Refresh) => {
                            refresh_once(&aggregator, &user_id, &events).await;
                        }
                        Some(BadgeCommand::Stop) | None => {
                            log::info!("Badge refresher stopped");
                            break;
                        }
                    }
                }
            }
        });

        BadgeHandle { tx }
    }
}

async fn refresh_once(
    aggregator: &NotificationAggregator,
    user_id: &str,
    events: &EventSender,
) {
    match aggregator.unread_count(user_id).await {
        Ok(unread) => {
            let _ = events.send(NotificationEvent::BadgeUpdated { unread });
        }
        Err(e) => {
            // Keep the stale badge; the next tick retries.
            log::warn!("Badge refresh failed: {}", e);
            let _ = events.send(NotificationEvent::FetchFailed {
                message: e.to_string(),
            });
        }
    }
}
