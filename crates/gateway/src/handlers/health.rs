//! Health check handlers

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct GreetingResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Static greeting
pub async fn root() -> Json<GreetingResponse> {
    Json(GreetingResponse {
        message: "Hello from PaperLane!".to_string(),
    })
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
