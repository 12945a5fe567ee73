//! Notification aggregator.
//!
//! Produces one time-ordered feed combining broadcast and per-user
//! notifications. The two collections are fetched concurrently and joined
//! fail-fast: if either request errors, the whole fetch errors and no
//! partial result is produced.

use serde::Serialize;

use crate::error::AppError;
use crate::models::{FeedItem, GlobalNotification, PersonalNotification};
use crate::services::api_client::{AgroPecClient, MarkAllReadResponse};
use uuid::Uuid;

/// The merged feed plus its derived unread count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    /// Merged items, most recent first.
    pub items: Vec<FeedItem>,

    /// Personal notifications not yet read. Globals never count.
    pub unread: usize,
}

impl FeedSnapshot {
    fn build(globals: Vec<GlobalNotification>, personals: Vec<PersonalNotification>) -> Self {
        let items = merge_feed(globals, personals);
        let unread = count_unread(&items);
        Self { items, unread }
    }
}

/// Normalize both collections into `FeedItem`s and sort by creation time,
/// most recent first. The sort is stable; ties keep source order.
pub fn merge_feed(
    globals: Vec<GlobalNotification>,
    personals: Vec<PersonalNotification>,
) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = globals
        .into_iter()
        .map(FeedItem::from_global)
        .chain(personals.into_iter().map(FeedItem::from_personal))
        .collect();

    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items
}

/// Count the items that contribute to the unread badge.
pub fn count_unread(items: &[FeedItem]) -> usize {
    items.iter().filter(|item| item.counts_as_unread()).count()
}

/// Aggregates global and personal notifications for one user.
pub struct NotificationAggregator {
    client: AgroPecClient,
}

impl NotificationAggregator {
    pub fn new(client: AgroPecClient) -> Self {
        Self { client }
    }

    /// Fetch and merge both collections for the given user.
    ///
    /// Both requests run concurrently; failure of either propagates as a
    /// single aggregate failure.
    pub async fn fetch_feed(&self, user_id: &str) -> Result<FeedSnapshot, AppError> {
        let (globals, personals) = tokio::try_join!(
            self.client.get_delivered_notifications(),
            self.client.get_user_notifications(user_id),
        )?;

        Ok(FeedSnapshot::build(globals, personals))
    }

    /// Feed for an unauthenticated client: broadcast notifications only.
    pub async fn fetch_feed_guest(&self) -> Result<FeedSnapshot, AppError> {
        let globals = self.client.get_delivered_notifications().await?;
        Ok(FeedSnapshot::build(globals, Vec::new()))
    }

    /// Recompute the unread badge count for a user.
    pub async fn unread_count(&self, user_id: &str) -> Result<usize, AppError> {
        let personals = self.client.get_user_notifications(user_id).await?;
        Ok(personals
            .iter()
            .filter(|n| n.status.is_unread())
            .count())
    }

    /// Mark one personal notification as read.
    ///
    /// Global notification identifiers are not mapped by the server and
    /// surface as a not-found error rather than an ambiguous failure.
    pub async fn mark_read(
        &self,
        user_id: &str,
        notification_id: Uuid,
    ) -> Result<PersonalNotification, AppError> {
        self.client
            .mark_notification_read(user_id, notification_id)
            .await
    }

    /// Mark all personal notifications as read; returns how many changed.
    pub async fn mark_all_read(&self, user_id: &str) -> Result<MarkAllReadResponse, AppError> {
        self.client.mark_all_notifications_read(user_id).await
    }

    /// Delete one personal notification.
    pub async fn delete(&self, user_id: &str, notification_id: Uuid) -> Result<(), AppError> {
        self.client.delete_notification(user_id, notification_id).await
    }

    /// Delete all personal notifications.
    pub async fn delete_all(&self, user_id: &str) -> Result<(), AppError> {
        self.client.delete_all_notifications(user_id).await
    }
}
