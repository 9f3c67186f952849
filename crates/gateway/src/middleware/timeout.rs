//! Whole-request deadline middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use paperlane_common::errors::AppError;
use std::time::Duration;

/// Fail a request that outlives `limit` with the 504 error payload
pub async fn request_timeout(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    tokio::time::timeout(limit, next.run(request))
        .await
        .map_err(|_| {
            tracing::warn!(limit_secs = limit.as_secs(), "Request deadline exceeded");
            AppError::Timeout {
                seconds: limit.as_secs(),
            }
        })
}
