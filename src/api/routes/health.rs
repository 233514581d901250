//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::state::ApiState;
use crate::api::types::{EventLogHealth, HealthResponse};

/// GET /api/v1/health
///
/// Reports "ok" while the event log backend is healthy, "degraded" otherwise
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let event_log = match state.log.health_check().await {
        Ok(health) => EventLogHealth::new(state.log.name(), health),
        Err(e) => EventLogHealth {
            backend: state.log.name().to_string(),
            healthy: false,
            message: e.to_string(),
        },
    };

    Json(HealthResponse {
        status: if event_log.healthy { "ok" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        event_log,
    })
}
