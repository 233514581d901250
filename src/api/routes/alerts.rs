//! Alerts raised by a caregiver

use axum::{Json, extract::State};
use tracing::{info, instrument};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{DeliveryReport, ManualAlertRequest, ManualAlertResponse},
};

/// POST /api/v1/alerts/manual
///
/// Renders the alert like any other (generated text or template) and
/// delivers it to every channel. Bypasses the cool-down.
#[instrument(skip_all)]
pub async fn raise_manual_alert(
    State(state): State<ApiState>,
    Json(body): Json<ManualAlertRequest>,
) -> ApiResult<Json<ManualAlertResponse>> {
    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::BadRequest("reason must not be empty".to_string()));
    }

    let message = state
        .notifier
        .render_manual_alert(&state.subject.id, &state.subject.display_name(), reason)
        .await;

    let deliveries: Vec<_> = state
        .notifier
        .deliver(&message)
        .await
        .into_iter()
        .map(|(channel, result)| DeliveryReport::new(channel, result))
        .collect();

    info!(
        delivered = deliveries.iter().filter(|d| d.delivered).count(),
        "manual alert raised: {reason}"
    );

    Ok(Json(ManualAlertResponse {
        message,
        deliveries,
    }))
}
