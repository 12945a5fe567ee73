//! Unified feed projection.
//!
//! `FeedItem` is a read-only shape consumed by the presentation layer. It
//! merges global and personal notifications into one struct; the `global`
//! flag is the single source of truth for provenance. Consumers must not
//! infer provenance from field presence, since the two sources share
//! overlapping optional fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::notification::{
    DeliveryStatus, EventKind, GlobalNotification, NotificationCategory, PersonalNotification,
};

/// One entry of the merged notification feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: Uuid,

    /// Headline; only global notifications carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub message: String,

    /// Category; global notifications only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<NotificationCategory>,

    /// Related event kind; personal notifications only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_kind: Option<EventKind>,

    pub status: DeliveryStatus,

    pub created_at: DateTime<Utc>,

    /// Provenance flag: true for broadcast notifications, false for
    /// per-user ones.
    pub global: bool,

    /// Audience tags; global notifications only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Vec<String>>,

    /// Owning user; personal notifications only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Related event; personal notifications only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
}

impl FeedItem {
    /// Project a broadcast notification into the unified shape.
    pub fn from_global(n: GlobalNotification) -> Self {
        Self {
            id: n.id,
            title: Some(n.title),
            message: n.message,
            category: Some(n.category),
            event_kind: None,
            status: n.status,
            created_at: n.created_at,
            global: true,
            audience: Some(n.audience),
            user_id: None,
            event_id: None,
        }
    }

    /// Project a per-user notification into the unified shape.
    pub fn from_personal(n: PersonalNotification) -> Self {
        Self {
            id: n.id,
            title: None,
            message: n.message,
            category: None,
            event_kind: Some(n.event_kind),
            status: n.status,
            created_at: n.created_at,
            global: false,
            audience: None,
            user_id: Some(n.user_id),
            event_id: Some(n.event_id),
        }
    }

    /// Whether this item counts toward the unread badge.
    ///
    /// Global notifications are informational and never count, regardless
    /// of their delivery status.
    pub fn counts_as_unread(&self) -> bool {
        !self.global && self.status.is_unread()
    }
}
