//! Tauri IPC command handlers.
//!
//! This module contains all commands exposed to the frontend via Tauri's invoke system.
//! Commands are organized by functionality:
//! - `auth`: session management backed by the OS keychain
//! - `notifications`: merged feed retrieval and mutations
//! - `live`: live channel control and state
//! - `toasts`: toast presentation
//! - `settings`: notification preferences

pub mod auth;
pub mod live;
pub mod notifications;
pub mod settings;
pub mod toasts;

pub use auth::{get_session_status, login, logout, restore_session};
pub use live::{get_live_channel_state, start_live_channel, stop_live_channel};
pub use notifications::{
    clear_notifications, delete_notification, get_notification_feed, get_unread_count,
    mark_all_notifications_read, mark_notification_read,
};
pub use settings::{get_notification_preferences, update_notification_preferences};
pub use toasts::{dismiss_toast, get_active_toasts};
