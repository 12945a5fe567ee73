//! Data models for the application.
//!
//! These models represent the notification entities received from the
//! AgroPec API and the shapes used for IPC communication with the frontend.
//!
//! All models derive Serialize for Tauri IPC.

pub mod feed;
pub mod notification;
pub mod preferences;
pub mod session;

// Re-exports for convenient access
pub use feed::FeedItem;
pub use notification::{
    DeliveryStatus, EventKind, GlobalNotification, NotificationCategory, PersonalNotification,
};
pub use preferences::NotificationPreferences;
pub use session::{Session, SessionState, SessionStatus};
