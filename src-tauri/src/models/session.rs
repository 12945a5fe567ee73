//! User session model and shared session slot.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

/// An authenticated session.
///
/// The token is opaque to this application; it is attached to every API
/// call and embedded in the live channel URL.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identifier of the logged-in user.
    pub user_id: String,

    /// Opaque credential token.
    pub token: String,

    /// Whether this is an administrator session.
    pub admin: bool,
}

/// Session summary returned to the frontend. Never carries the token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub admin: bool,
}

impl SessionStatus {
    /// Status for an unauthenticated client.
    pub fn guest() -> Self {
        Self {
            authenticated: false,
            user_id: None,
            admin: false,
        }
    }
}

impl From<&Session> for SessionStatus {
    fn from(session: &Session) -> Self {
        Self {
            authenticated: true,
            user_id: Some(session.user_id.clone()),
            admin: session.admin,
        }
    }
}

/// Single-slot session storage managed as Tauri state.
///
/// Overwritten on login, cleared on logout. All access goes through the
/// async lock; there are no other writers.
#[derive(Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current session.
    pub async fn set(&self, session: Session) {
        *self.inner.write().await = Some(session);
    }

    /// Clear the current session.
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }

    /// Snapshot of the current session, if any.
    pub async fn current(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    /// Status summary for the frontend.
    pub async fn status(&self) -> SessionStatus {
        match self.inner.read().await.as_ref() {
            Some(session) => SessionStatus::from(session),
            None => SessionStatus::guest(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_slot_overwrite_and_clear() {
        let state = SessionState::new();
        assert!(state.current().await.is_none());

        state
            .set(Session {
                user_id: "u1".to_string(),
                token: "t1".to_string(),
                admin: false,
            })
            .await;
        assert_eq!(state.current().await.unwrap().user_id, "u1");

        // Login overwrites the single slot
        state
            .set(Session {
                user_id: "u2".to_string(),
                token: "t2".to_string(),
                admin: true,
            })
            .await;
        let status = state.status().await;
        assert!(status.authenticated);
        assert_eq!(status.user_id.as_deref(), Some("u2"));
        assert!(status.admin);

        state.clear().await;
        assert!(!state.status().await.authenticated);
    }

    #[test]
    fn test_status_never_serializes_token() {
        let status = SessionStatus {
            authenticated: true,
            user_id: Some("u1".to_string()),
            admin: false,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("token"));
    }
}
