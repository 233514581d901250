//! REST API for the caregiver dashboard
//!
//! Read access to the event log and banner messages, reminder management
//! and the chat assistant. No HTML is rendered here.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check including the event log backend
//! - `GET /api/v1/stats` - Per-actor tick statistics
//! - `GET /api/v1/log?limit=n&since=t` - Most recent event log entries,
//!   optionally only those sampled at or after `t` (RFC 3339)
//! - `GET /api/v1/alerts?limit=n` - Most recent entries that fired an alert
//! - `POST /api/v1/alerts/manual` - Raise an alert by hand
//! - `GET /api/v1/reminders` - List reminders
//! - `POST /api/v1/reminders` - Create a reminder
//! - `DELETE /api/v1/reminders/:id` - Delete a reminder
//! - `GET /api/v1/banners?limit=n` - Recent banner messages
//! - `POST /api/v1/chat` - Ask the assistant

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiSettings;

/// Build the router with every route and the configured layers
pub fn router(settings: &ApiSettings, state: ApiState) -> Router {
    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/stats", get(routes::stats::get_stats))
        .route("/api/v1/log", get(routes::log::tail))
        .route("/api/v1/alerts", get(routes::log::alerts))
        .route("/api/v1/alerts/manual", post(routes::alerts::raise_manual_alert))
        .route(
            "/api/v1/reminders",
            get(routes::reminders::list_reminders).post(routes::reminders::create_reminder),
        )
        .route(
            "/api/v1/reminders/:id",
            delete(routes::reminders::delete_reminder),
        )
        .route("/api/v1/banners", get(routes::banners::recent_banners))
        .route("/api/v1/chat", post(routes::chat::chat))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if settings.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    if let Some(token) = settings.token.clone() {
        app = app.layer(axum::middleware::from_fn_with_state(
            token,
            middleware::auth::require_token,
        ));
    }

    app
}

/// Spawn the API server in a background task and return its local address
pub async fn spawn_api_server(settings: ApiSettings, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", settings.bind);

    let app = router(&settings, state);

    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
