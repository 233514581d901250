use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::LimitQuery,
};
use crate::notify::Message;

/// GET /api/v1/banners?limit=n
pub async fn recent_banners(
    State(state): State<ApiState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    let board = state
        .banners
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("no banner channel configured".to_string()))?;

    Ok(Json(board.recent(query.limit())))
}
