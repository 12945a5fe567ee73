//! Settings commands for notification preferences.
//!
//! Preferences are persisted using the tauri-plugin-store, with an
//! in-memory cache so reads do not hit the store file every time.

use crate::error::AppError;
use crate::models::NotificationPreferences;
use std::sync::OnceLock;
use tauri::AppHandle;
use tauri_plugin_store::StoreExt;
use tokio::sync::RwLock;

/// Store filename for settings.
const SETTINGS_STORE: &str = "settings.json";

/// Key for notification preferences in the store.
const PREFERENCES_KEY: &str = "notification_preferences";

/// In-memory cache of preferences.
static PREFERENCES_CACHE: OnceLock<RwLock<Option<NotificationPreferences>>> = OnceLock::new();

fn preferences_cache() -> &'static RwLock<Option<NotificationPreferences>> {
    PREFERENCES_CACHE.get_or_init(|| RwLock::new(None))
}

fn load_preferences(app: &AppHandle) -> Result<NotificationPreferences, AppError> {
    let store = app
        .store(SETTINGS_STORE)
        .map_err(|e| AppError::internal(format!("Failed to open settings store: {}", e)))?;

    let preferences = match store.get(PREFERENCES_KEY) {
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_default(),
        None => NotificationPreferences::default(),
    };

    Ok(preferences)
}

fn save_preferences(
    app: &AppHandle,
    preferences: &NotificationPreferences,
) -> Result<(), AppError> {
    let store = app
        .store(SETTINGS_STORE)
        .map_err(|e| AppError::internal(format!("Failed to open settings store: {}", e)))?;

    store.set(PREFERENCES_KEY, serde_json::to_value(preferences)?);
    store
        .save()
        .map_err(|e| AppError::internal(format!("Failed to save settings store: {}", e)))?;

    Ok(())
}

/// Read preferences outside a command context (event forwarding).
pub async fn current_preferences(app: &AppHandle) -> NotificationPreferences {
    if let Some(cached) = preferences_cache().read().await.clone() {
        return cached;
    }
    let loaded = load_preferences(app).unwrap_or_default();
    *preferences_cache().write().await = Some(loaded.clone());
    loaded
}

/// Get the current notification preferences.
#[tauri::command]
pub async fn get_notification_preferences(
    app: AppHandle,
) -> Result<NotificationPreferences, AppError> {
    Ok(current_preferences(&app).await)
}

/// Update and persist notification preferences.
#[tauri::command]
pub async fn update_notification_preferences(
    app: AppHandle,
    preferences: NotificationPreferences,
) -> Result<NotificationPreferences, AppError> {
    save_preferences(&app, &preferences)?;
    *preferences_cache().write().await = Some(preferences.clone());
    Ok(preferences)
}
