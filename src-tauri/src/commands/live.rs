//! Live channel control commands.

use crate::error::AppError;
use crate::models::SessionState;
use crate::services::live_channel::LiveChannelState;
use crate::services::runtime::AppRuntime;
use tauri::State;

/// Start the live channel for the current session.
///
/// A silent no-op without a session: the feed then relies on polling
/// alone, which is the expected guest behavior rather than an error.
#[tauri::command]
pub async fn start_live_channel(
    session_state: State<'_, SessionState>,
    runtime: State<'_, AppRuntime>,
) -> Result<(), AppError> {
    let Some(session) = session_state.current().await else {
        log::info!("Live channel not started: no session");
        return Ok(());
    };

    runtime.start_live_channel(&session.token).await;
    Ok(())
}

/// Tear the live channel down.
#[tauri::command]
pub async fn stop_live_channel(runtime: State<'_, AppRuntime>) -> Result<(), AppError> {
    runtime.stop_live_channel().await;
    Ok(())
}

/// Current live channel state for rendering the connection indicator.
#[tauri::command]
pub async fn get_live_channel_state(
    runtime: State<'_, AppRuntime>,
) -> Result<LiveChannelState, AppError> {
    Ok(runtime.live_state().await)
}
