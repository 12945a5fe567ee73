//! Per-session runtime for the notification background services.
//!
//! Owns the live channel and badge refresher handles so login and logout
//! can start and stop them as a unit. Managed as Tauri state.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::Session;
use crate::services::aggregator::NotificationAggregator;
use crate::services::api_client::{AgroPecClient, ApiClientConfig};
use crate::services::badge::{BadgeHandle, BadgeRefresher, BADGE_POLL_INTERVAL};
use crate::services::events::EventSender;
use crate::services::live_channel::{
    LiveChannel, LiveChannelConfig, LiveChannelHandle, LiveChannelState,
};
use crate::services::toasts::ToastManager;

pub struct AppRuntime {
    events: EventSender,
    toasts: ToastManager,
    live: RwLock<Option<LiveChannelHandle>>,
    badge: RwLock<Option<BadgeHandle>>,
}

impl AppRuntime {
    pub fn new(events: EventSender, toasts: ToastManager) -> Self {
        Self {
            events,
            toasts,
            live: RwLock::new(None),
            badge: RwLock::new(None),
        }
    }

    pub fn toasts(&self) -> &ToastManager {
        &self.toasts
    }

    /// Start the live channel and badge refresher for a signed-in user.
    ///
    /// Any services from a previous session are stopped first.
    pub async fn start_user_services(&self, session: &Session) -> Result<(), AppError> {
        self.stop_user_services().await;

        let client = AgroPecClient::new(ApiClientConfig::with_token(&session.token))?;
        let aggregator = Arc::new(NotificationAggregator::new(client));

        let live = LiveChannel::start(
            LiveChannelConfig::new(&session.token),
            self.events.clone(),
            self.toasts.clone(),
        );
        *self.live.write().await = Some(live);

        let badge = BadgeRefresher::start(
            aggregator,
            session.user_id.clone(),
            self.events.clone(),
            BADGE_POLL_INTERVAL,
        );
        *self.badge.write().await = Some(badge);

        log::info!("User services started for {}", session.user_id);
        Ok(())
    }

    /// Stop both background services. Safe to call when nothing runs.
    pub async fn stop_user_services(&self) {
        if let Some(live) = self.live.write().await.take() {
            live.stop();
        }
        if let Some(badge) = self.badge.write().await.take() {
            badge.stop().await;
        }
    }

    /// Current live channel state; `Idle` when no channel exists.
    pub async fn live_state(&self) -> LiveChannelState {
        match self.live.read().await.as_ref() {
            Some(handle) => handle.state().await,
            None => LiveChannelState::Idle,
        }
    }

    pub async fn has_live_channel(&self) -> bool {
        self.live.read().await.is_some()
    }

    /// Start a standalone live channel with the given token.
    pub async fn start_live_channel(&self, token: &str) {
        if let Some(previous) = self.live.write().await.take() {
            previous.stop();
        }
        let handle = LiveChannel::start(
            LiveChannelConfig::new(token),
            self.events.clone(),
            self.toasts.clone(),
        );
        *self.live.write().await = Some(handle);
    }

    pub async fn stop_live_channel(&self) {
        if let Some(handle) = self.live.write().await.take() {
            handle.stop();
        }
    }

    /// Ask the badge refresher for an off-schedule poll.
    pub async fn refresh_badge(&self) {
        if let Some(badge) = self.badge.read().await.as_ref() {
            badge.refresh().await;
        }
    }
}
