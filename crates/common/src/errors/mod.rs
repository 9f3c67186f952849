//! Error types for PaperLane services
//!
//! Every failure inside an adapter, the RAG assembler or the router is an
//! [`AppError`]. The endpoint layer renders it as the ErrorPayload shape
//! `{"error": "<message>"}`, so no fault reaches a caller unstructured.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned when a request carries no usable query
pub const NO_QUERY_MESSAGE: &str = "No query provided";

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    MissingQuery,

    // Rate limiting (6xxx)
    RateLimited,

    // External service errors (8xxx)
    UpstreamStatus,
    PaperSearchError,
    WebSearchError,
    EmbeddingError,
    VectorStoreError,
    GenerationError,
    UpstreamError,
    Timeout,

    // Internal errors (9xxx)
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingQuery => 1002,

            ErrorCode::RateLimited => 6001,

            ErrorCode::UpstreamStatus => 8001,
            ErrorCode::PaperSearchError => 8002,
            ErrorCode::WebSearchError => 8003,
            ErrorCode::EmbeddingError => 8004,
            ErrorCode::VectorStoreError => 8005,
            ErrorCode::GenerationError => 8006,
            ErrorCode::UpstreamError => 8007,
            ErrorCode::Timeout => 8008,

            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Missing input
    #[error("No query provided")]
    MissingQuery,

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Transport failures
    #[error("Failed to fetch data from Arxiv. Status code: {status}")]
    ArxivStatus { status: u16 },

    #[error("An error occurred while searching: {message}")]
    PaperSearch { message: String },

    #[error("An error occurred during web search: {message}")]
    WebSearch { message: String },

    #[error("Embedding service error: {message}")]
    Embedding { message: String },

    #[error("Vector store error: {message}")]
    VectorStore { message: String },

    #[error("Text generation failed: {message}")]
    Generation { message: String },

    #[error("HTTP client error: {}", describe_http_error(.0))]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to parse feed: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::MissingQuery => ErrorCode::MissingQuery,
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::ArxivStatus { .. } => ErrorCode::UpstreamStatus,
            AppError::PaperSearch { .. } => ErrorCode::PaperSearchError,
            AppError::WebSearch { .. } => ErrorCode::WebSearchError,
            AppError::Embedding { .. } => ErrorCode::EmbeddingError,
            AppError::VectorStore { .. } => ErrorCode::VectorStoreError,
            AppError::Generation { .. } => ErrorCode::GenerationError,
            AppError::HttpClient(_) | AppError::Xml(_) => ErrorCode::UpstreamError,
            AppError::Timeout { .. } => ErrorCode::Timeout,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::MissingQuery | AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 502 Bad Gateway
            AppError::ArxivStatus { .. }
            | AppError::PaperSearch { .. }
            | AppError::WebSearch { .. }
            | AppError::Embedding { .. }
            | AppError::VectorStore { .. }
            | AppError::Generation { .. }
            | AppError::HttpClient(_)
            | AppError::Xml(_) => StatusCode::BAD_GATEWAY,

            // 504 Gateway Timeout
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            AppError::Configuration { .. } | AppError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Render this error as the wire payload
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
        }
    }
}

/// Render a transport error, naming timeouts explicitly since reqwest's
/// display text does not
pub fn describe_http_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out ({})", error)
    } else {
        error.to_string()
    }
}

/// Structured error body: a single `error` key holding a readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let payload = self.to_payload();

        if self.is_server_error() {
            tracing::error!(
                error = %payload.error,
                code = code.as_code(),
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %payload.error,
                code = code.as_code(),
                status = status.as_u16(),
                "Client error"
            );
        }

        (status, Json(payload)).into_response()
    }
}
