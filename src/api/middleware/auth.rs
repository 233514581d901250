//! Bearer token check for every API route

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::api::ApiError;

/// Token carried in `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::Unauthorized("missing Authorization header"))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Authorization header is not valid text"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(ApiError::Unauthorized("expected Authorization: Bearer <token>"))
}

pub async fn require_token(
    State(expected): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if bearer_token(request.headers())? != expected {
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}
