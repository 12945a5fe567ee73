//! Notification feed commands.
//!
//! These commands expose the merged notification feed and its mutations to
//! the frontend. Visitors without a session still get the global feed;
//! everything that touches personal notifications requires one.

use crate::error::AppError;
use crate::models::{Session, SessionState};
use crate::services::aggregator::{FeedSnapshot, NotificationAggregator};
use crate::services::api_client::{AgroPecClient, ApiClientConfig, MarkAllReadResponse};
use crate::services::runtime::AppRuntime;
use tauri::State;
use uuid::Uuid;

fn aggregator_for(session: &Session) -> Result<NotificationAggregator, AppError> {
    let client = AgroPecClient::new(ApiClientConfig::with_token(&session.token))?;
    Ok(NotificationAggregator::new(client))
}

async fn require_session(session_state: &SessionState) -> Result<Session, AppError> {
    session_state
        .current()
        .await
        .ok_or_else(|| AppError::authentication("No active session"))
}

/// Fetch the merged notification feed.
///
/// Signed-in users get global and personal notifications interleaved,
/// newest first; guests get the global feed only. Either source failing
/// fails the whole fetch.
#[tauri::command]
pub async fn get_notification_feed(
    session_state: State<'_, SessionState>,
) -> Result<FeedSnapshot, AppError> {
    match session_state.current().await {
        Some(session) => {
            aggregator_for(&session)?
                .fetch_feed(&session.user_id)
                .await
        }
        None => {
            let client = AgroPecClient::new(ApiClientConfig::default())?;
            NotificationAggregator::new(client).fetch_feed_guest().await
        }
    }
}

/// Number of unread personal notifications. Zero for guests.
#[tauri::command]
pub async fn get_unread_count(
    session_state: State<'_, SessionState>,
) -> Result<usize, AppError> {
    match session_state.current().await {
        Some(session) => {
            aggregator_for(&session)?
                .unread_count(&session.user_id)
                .await
        }
        None => Ok(0),
    }
}

/// Mark one personal notification as read.
#[tauri::command]
pub async fn mark_notification_read(
    session_state: State<'_, SessionState>,
    runtime: State<'_, AppRuntime>,
    notification_id: Uuid,
) -> Result<(), AppError> {
    let session = require_session(&session_state).await?;
    aggregator_for(&session)?
        .mark_read(&session.user_id, notification_id)
        .await?;
    runtime.refresh_badge().await;
    Ok(())
}

/// Mark every personal notification as read. Returns how many changed.
#[tauri::command]
pub async fn mark_all_notifications_read(
    session_state: State<'_, SessionState>,
    runtime: State<'_, AppRuntime>,
) -> Result<MarkAllReadResponse, AppError> {
    let session = require_session(&session_state).await?;
    let response = aggregator_for(&session)?
        .mark_all_read(&session.user_id)
        .await?;
    runtime.refresh_badge().await;
    Ok(response)
}

/// Delete one personal notification.
#[tauri::command]
pub async fn delete_notification(
    session_state: State<'_, SessionState>,
    runtime: State<'_, AppRuntime>,
    notification_id: Uuid,
) -> Result<(), AppError> {
    let session = require_session(&session_state).await?;
    aggregator_for(&session)?
        .delete(&session.user_id, notification_id)
        .await?;
    runtime.refresh_badge().await;
    Ok(())
}

/// Delete every personal notification for the signed-in user.
#[tauri::command]
pub async fn clear_notifications(
    session_state: State<'_, SessionState>,
    runtime: State<'_, AppRuntime>,
) -> Result<(), AppError> {
    let session = require_session(&session_state).await?;
    aggregator_for(&session)?.delete_all(&session.user_id).await?;
    runtime.refresh_badge().await;
    Ok(())
}
