//! Toast presentation commands.

use crate::error::AppError;
use crate::services::runtime::AppRuntime;
use crate::services::toasts::Toast;
use tauri::State;
use uuid::Uuid;

/// Toasts currently on screen, oldest first.
#[tauri::command]
pub async fn get_active_toasts(runtime: State<'_, AppRuntime>) -> Result<Vec<Toast>, AppError> {
    Ok(runtime.toasts().active().await)
}

/// Dismiss a toast by id. Unknown ids are ignored.
#[tauri::command]
pub async fn dismiss_toast(
    runtime: State<'_, AppRuntime>,
    toast_id: Uuid,
) -> Result<(), AppError> {
    runtime.toasts().dismiss(toast_id).await;
    Ok(())
}
