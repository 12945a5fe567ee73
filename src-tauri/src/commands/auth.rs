//! Authentication commands for session management.
//!
//! These commands handle signing in, signing out, and restoring a previous
//! session, with tokens stored securely in the OS keychain. Only the user
//! identity and role flag go into the settings store; the token never does.

use crate::error::AppError;
use crate::models::{Session, SessionState, SessionStatus};
use crate::services::credentials::{CredentialService, TokenSlot};
use crate::services::runtime::AppRuntime;
use serde::{Deserialize, Serialize};
use tauri::{AppHandle, State};
use tauri_plugin_store::StoreExt;

/// Store filename for settings.
const SETTINGS_STORE: &str = "settings.json";

/// Key for the persisted session identity in the store.
const SESSION_KEY: &str = "session";

/// Input for the login command.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    /// Identifier of the signed-in user.
    pub user_id: String,

    /// Session token issued by the AgroPec API.
    pub token: String,

    /// Whether this session carries the admin role.
    #[serde(default)]
    pub admin: bool,
}

/// Identity persisted across restarts. The token lives in the keychain.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredIdentity {
    user_id: String,
    admin: bool,
}

fn slot_for(admin: bool) -> TokenSlot {
    if admin {
        TokenSlot::Admin
    } else {
        TokenSlot::Attendee
    }
}

fn persist_identity(app: &AppHandle, identity: Option<&StoredIdentity>) -> Result<(), AppError> {
    let store = app
        .store(SETTINGS_STORE)
        .map_err(|e| AppError::internal(format!("Failed to open settings store: {}", e)))?;

    match identity {
        Some(identity) => store.set(SESSION_KEY, serde_json::to_value(identity)?),
        None => {
            store.delete(SESSION_KEY);
        }
    }
    store
        .save()
        .map_err(|e| AppError::internal(format!("Failed to save settings store: {}", e)))
}

/// Sign in with a token issued by the AgroPec API.
///
/// This command:
/// 1. Stores the token securely in the OS keychain
/// 2. Records the user identity in the settings store
/// 3. Starts the live channel and badge refresher
///
/// # Errors
/// - Credential storage error if keychain access fails
/// - Invalid input if the user id or token is empty
#[tauri::command]
pub async fn login(
    app: AppHandle,
    session_state: State<'_, SessionState>,
    runtime: State<'_, AppRuntime>,
    input: LoginInput,
) -> Result<SessionStatus, AppError> {
    if input.user_id.trim().is_empty() {
        return Err(AppError::invalid_input_field("user id is required", "userId"));
    }
    if input.token.trim().is_empty() {
        return Err(AppError::invalid_input_field("token is required", "token"));
    }

    CredentialService::store_token(slot_for(input.admin), &input.token)?;
    persist_identity(
        &app,
        Some(&StoredIdentity {
            user_id: input.user_id.clone(),
            admin: input.admin,
        }),
    )?;

    let session = Session {
        user_id: input.user_id,
        token: input.token,
        admin: input.admin,
    };

    runtime.start_user_services(&session).await?;
    let status = SessionStatus::from(&session);
    session_state.set(session).await;

    Ok(status)
}

/// Sign out: stop background services and forget the stored token.
#[tauri::command]
pub async fn logout(
    app: AppHandle,
    session_state: State<'_, SessionState>,
    runtime: State<'_, AppRuntime>,
) -> Result<SessionStatus, AppError> {
    runtime.stop_user_services().await;

    if let Some(session) = session_state.current().await {
        CredentialService::delete_token(slot_for(session.admin))?;
    }
    persist_identity(&app, None)?;
    session_state.clear().await;

    Ok(SessionStatus::guest())
}

/// Current session status. Never exposes the token.
#[tauri::command]
pub async fn get_session_status(
    session_state: State<'_, SessionState>,
) -> Result<SessionStatus, AppError> {
    Ok(session_state.status().await)
}

/// Restore the previous session on startup, if one exists.
///
/// Reads the persisted identity from the settings store and the matching
/// token from the keychain. When either is missing the app stays signed
/// out; no error is raised.
#[tauri::command]
pub async fn restore_session(
    app: AppHandle,
    session_state: State<'_, SessionState>,
    runtime: State<'_, AppRuntime>,
) -> Result<SessionStatus, AppError> {
    let store = app
        .store(SETTINGS_STORE)
        .map_err(|e| AppError::internal(format!("Failed to open settings store: {}", e)))?;

    let identity: StoredIdentity = match store.get(SESSION_KEY) {
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(identity) => identity,
            Err(e) => {
                log::warn!("Discarding unreadable stored session: {}", e);
                store.delete(SESSION_KEY);
                return Ok(SessionStatus::guest());
            }
        },
        None => return Ok(SessionStatus::guest()),
    };

    let token = match CredentialService::get_token(slot_for(identity.admin)) {
        Ok(token) => token,
        Err(AppError::NotFound { .. }) => {
            log::info!("Stored session has no keychain token; staying signed out");
            return Ok(SessionStatus::guest());
        }
        Err(e) => return Err(e),
    };

    let session = Session {
        user_id: identity.user_id,
        token,
        admin: identity.admin,
    };

    runtime.start_user_services(&session).await?;
    let status = SessionStatus::from(&session);
    session_state.set(session).await;

    Ok(status)
}
