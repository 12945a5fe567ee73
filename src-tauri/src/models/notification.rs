//! Notification models.
//!
//! Two distinct entities arrive from the AgroPec API: broadcast
//! notifications authored by administrators (`GlobalNotification`) and
//! per-user notifications tied to a registered activity or stand
//! (`PersonalNotification`). They are merged into a single feed by the
//! aggregator service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a broadcast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Announcement,
    Alert,
    System,
    Event,
}

impl From<&str> for NotificationCategory {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "alert" => Self::Alert,
            "system" => Self::System,
            "event" => Self::Event,
            _ => Self::Announcement,
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Announcement => write!(f, "announcement"),
            Self::Alert => write!(f, "alert"),
            Self::System => write!(f, "system"),
            Self::Event => write!(f, "event"),
        }
    }
}

/// Delivery status of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Read,
}

impl DeliveryStatus {
    /// Whether the notification still counts toward the unread badge.
    pub fn is_unread(self) -> bool {
        matches!(self, Self::Pending | Self::Delivered)
    }
}

impl From<&str> for DeliveryStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "delivered" => Self::Delivered,
            "read" => Self::Read,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Delivered => write!(f, "delivered"),
            Self::Read => write!(f, "read"),
        }
    }
}

/// Kind of fair event a personal notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Activity,
    Stand,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Activity => write!(f, "activity"),
            Self::Stand => write!(f, "stand"),
        }
    }
}

/// Broadcast notification authored by an administrator.
///
/// Targets audience segments via role tags (e.g. "all", "visitors").
/// Never user-deletable; persists until administratively removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalNotification {
    pub id: Uuid,

    /// Headline shown in the feed and in toasts.
    pub title: String,

    /// Body text.
    pub message: String,

    pub category: NotificationCategory,

    pub status: DeliveryStatus,

    /// When the notification is scheduled to go out, if scheduled.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,

    /// Audience role tags this notification targets.
    #[serde(default)]
    pub audience: Vec<String>,

    pub created_at: DateTime<Utc>,
}

/// Per-user notification tied to an event the user is registered for.
///
/// Created server-side when a relevant activity or stand approaches;
/// mutated by the user (mark read, delete) or by status transitions.
///
/// The live channel's legacy wire format carries the identifier under
/// `uuid` instead of `id`, hence the serde alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalNotification {
    #[serde(alias = "uuid")]
    pub id: Uuid,

    /// Owning user.
    pub user_id: String,

    /// Body text.
    pub message: String,

    /// The activity or stand this notification is about.
    pub event_id: Uuid,

    /// Whether the related event is an activity or a stand.
    pub event_kind: EventKind,

    /// Scheduled delivery time, if any.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,

    pub status: DeliveryStatus,

    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            NotificationCategory::from("announcement"),
            NotificationCategory::Announcement
        );
        assert_eq!(NotificationCategory::from("ALERT"), NotificationCategory::Alert);
        assert_eq!(NotificationCategory::from("System"), NotificationCategory::System);
        // Unknown categories fall back to announcement
        assert_eq!(
            NotificationCategory::from("unknown"),
            NotificationCategory::Announcement
        );
    }

    #[test]
    fn test_status_is_unread() {
        assert!(DeliveryStatus::Pending.is_unread());
        assert!(DeliveryStatus::Delivered.is_unread());
        assert!(!DeliveryStatus::Read.is_unread());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(DeliveryStatus::Pending.to_string(), "pending");
        assert_eq!(DeliveryStatus::Delivered.to_string(), "delivered");
        assert_eq!(DeliveryStatus::Read.to_string(), "read");
    }

    #[test]
    fn test_personal_notification_accepts_uuid_alias() {
        let json = r#"{
            "uuid": "8f14e45f-ceea-467f-a8cf-95d1e0a8e9a1",
            "userId": "user-1",
            "message": "Horse show starts in 15 minutes",
            "eventId": "6c8a2b11-05a0-43d8-9f71-2e5b1b1f3c77",
            "eventKind": "activity",
            "status": "delivered",
            "createdAt": "2024-08-01T12:00:00Z"
        }"#;

        let n: PersonalNotification = serde_json::from_str(json).unwrap();
        assert_eq!(n.user_id, "user-1");
        assert_eq!(n.event_kind, EventKind::Activity);
        assert_eq!(n.status, DeliveryStatus::Delivered);
    }
}
