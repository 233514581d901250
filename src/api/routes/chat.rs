use axum::{Json, extract::State};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{ChatRequest, ChatResponse},
};

/// POST /api/v1/chat
///
/// Always answers; without a text generator the reply is a fixed apology
pub async fn chat(
    State(state): State<ApiState>,
    Json(body): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let reply = state.assistant.reply(&body.message).await;
    Ok(Json(ChatResponse { reply }))
}
