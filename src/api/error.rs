//! Errors returned by API handlers, rendered as `{"error": "..."}`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// No `Authorization: Bearer <token>` header
    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("invalid token")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    /// Feature not configured on this hub
    #[error("{0}")]
    Unavailable(String),

    #[error("storage failure: {0}")]
    Storage(#[source] StorageError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(e) = &self {
            tracing::error!("request failed: {e}");
        }

        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidInput(msg) => ApiError::BadRequest(msg),
            StorageError::NotFound(id) => ApiError::NotFound(format!("no reminder with id {id}")),
            other => ApiError::Storage(other),
        }
    }
}
