//! Event log endpoints

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{LimitQuery, LogQuery},
};
use crate::storage::LogEntry;
use crate::storage::event_log::keep_last;

/// GET /api/v1/log?limit=n&since=t
///
/// Most recent entries, most recent last. With `since`, only entries
/// sampled at or after it.
pub async fn tail(
    State(state): State<ApiState>,
    Query(query): Query<LogQuery>,
) -> ApiResult<Json<Vec<LogEntry>>> {
    let entries = match query.since {
        Some(since) => keep_last(state.log.since(since).await?, query.limit()),
        None => state.log.tail(query.limit()).await?,
    };
    Ok(Json(entries))
}

/// GET /api/v1/alerts?limit=n
pub async fn alerts(
    State(state): State<ApiState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<LogEntry>>> {
    Ok(Json(state.log.alerts(query.limit()).await?))
}
