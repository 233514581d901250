//! Reminder management endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::api::{error::ApiResult, state::ApiState, types::NewReminder};
use crate::storage::ReminderTask;

/// GET /api/v1/reminders
pub async fn list_reminders(State(state): State<ApiState>) -> ApiResult<Json<Vec<ReminderTask>>> {
    Ok(Json(state.reminders.list().await?))
}

/// POST /api/v1/reminders
///
/// Rejects an empty text or a time that is not `HH:MM` with 400
pub async fn create_reminder(
    State(state): State<ApiState>,
    Json(body): Json<NewReminder>,
) -> ApiResult<(StatusCode, Json<ReminderTask>)> {
    let task = state.reminders.create(&body.text, &body.time).await?;
    info!("reminder {} added for {}", task.id, task.time);
    Ok((StatusCode::CREATED, Json(task)))
}

/// DELETE /api/v1/reminders/:id
pub async fn delete_reminder(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.reminders.delete(id).await?;
    info!("reminder {id} deleted");
    Ok(StatusCode::NO_CONTENT)
}
