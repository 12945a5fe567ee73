//! AgroPec Companion - desktop client for the AgroPec fair notifications.
//!
//! This is the main library for the Tauri backend, exposing IPC commands
//! to the frontend and forwarding background service events to it.

pub mod commands;
pub mod error;
pub mod models;
pub mod services;

use commands::{
    clear_notifications, delete_notification, dismiss_toast, get_active_toasts,
    get_live_channel_state, get_notification_feed, get_notification_preferences,
    get_session_status, get_unread_count, login, logout, mark_all_notifications_read,
    mark_notification_read, restore_session, start_live_channel, stop_live_channel,
    update_notification_preferences,
};
use models::SessionState;
use services::events::{
    self, EventReceiver, NotificationEvent, BADGE_UPDATED_EVENT, FEED_INVALIDATED_EVENT,
    FETCH_FAILED_EVENT, LIVE_CHANNEL_STATE_EVENT, NOTIFICATION_RECEIVED_EVENT,
    TOASTS_CHANGED_EVENT,
};
use services::{AppRuntime, ToastManager};
use tauri::{AppHandle, Emitter, Manager};
use tauri_plugin_notification::NotificationExt;

/// Forward background service events to the frontend as Tauri events.
///
/// Runs for the lifetime of the app; the receiver closes only when every
/// sender is gone, which does not happen while the runtime is managed.
async fn forward_events(app: AppHandle, mut rx: EventReceiver) {
    while let Some(event) = rx.recv().await {
        match event {
            NotificationEvent::ChannelOpened
            | NotificationEvent::ChannelClosed { .. }
            | NotificationEvent::RetryExhausted { .. }
            | NotificationEvent::ParseFailure { .. } => {
                if let Err(e) = app.emit(LIVE_CHANNEL_STATE_EVENT, &event) {
                    log::warn!("Failed to emit live channel event: {}", e);
                }
            }
            NotificationEvent::NotificationReceived { notification } => {
                let preferences = commands::settings::current_preferences(&app).await;
                if preferences.native_notifications_enabled {
                    let shown = app
                        .notification()
                        .builder()
                        .title("AgroPec")
                        .body(&notification.message)
                        .show();
                    if let Err(e) = shown {
                        log::warn!("Failed to show native notification: {}", e);
                    }
                }
                if let Err(e) = app.emit(NOTIFICATION_RECEIVED_EVENT, &notification) {
                    log::warn!("Failed to emit notification event: {}", e);
                }
            }
            NotificationEvent::FeedInvalidated => {
                let _ = app.emit(FEED_INVALIDATED_EVENT, ());
                // A live push changes the unread count; refresh off-schedule
                app.state::<AppRuntime>().refresh_badge().await;
            }
            NotificationEvent::BadgeUpdated { unread } => {
                let _ = app.emit(BADGE_UPDATED_EVENT, unread);
            }
            NotificationEvent::FetchFailed { message } => {
                let _ = app.emit(FETCH_FAILED_EVENT, message);
            }
            NotificationEvent::ToastsChanged { toasts } => {
                let _ = app.emit(TOASTS_CHANGED_EVENT, toasts);
            }
        }
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_store::Builder::new().build())
        .plugin(tauri_plugin_notification::init())
        .setup(|app| {
            let (tx, rx) = events::channel();
            let toasts = ToastManager::new(tx.clone());

            app.manage(SessionState::new());
            app.manage(AppRuntime::new(tx, toasts));

            let handle = app.handle().clone();
            tauri::async_runtime::spawn(forward_events(handle, rx));

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            login,
            logout,
            get_session_status,
            restore_session,
            get_notification_feed,
            get_unread_count,
            mark_notification_read,
            mark_all_notifications_read,
            delete_notification,
            clear_notifications,
            start_live_channel,
            stop_live_channel,
            get_live_channel_state,
            get_active_toasts,
            dismiss_toast,
            get_notification_preferences,
            update_notification_preferences,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
