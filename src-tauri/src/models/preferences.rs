//! Notification preferences model.

use serde::{Deserialize, Serialize};

/// Notification preferences persisted in the local key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    /// Whether to mirror live notifications as native OS notifications.
    pub native_notifications_enabled: bool,

    /// Whether the install-prompt banner has been permanently dismissed.
    pub install_banner_dismissed: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            native_notifications_enabled: true,
            install_banner_dismissed: false,
        }
    }
}
