//! API handlers module

pub mod health;
pub mod rag;
pub mod route;
pub mod search;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use paperlane_common::errors::{AppError, Result};
use serde::Deserialize;
use validator::Validate;

/// Longest query accepted by any endpoint
pub const MAX_QUERY_CHARS: u64 = 4000;

/// Body of the single-backend endpoints
#[derive(Debug, Default, Deserialize, Validate)]
pub struct QueryRequest {
    #[serde(default)]
    #[validate(length(max = MAX_QUERY_CHARS))]
    pub query: Option<String>,
}

impl QueryRequest {
    /// Validate and return the query, short-circuiting when it is absent or blank
    pub fn require_query(self) -> Result<String> {
        self.validate().map_err(|e| AppError::Validation {
            message: e.to_string(),
        })?;

        match self.query {
            Some(query) if !query.trim().is_empty() => Ok(query),
            _ => Err(AppError::MissingQuery),
        }
    }
}

/// Unwrap a JSON body, treating a request without a JSON body as carrying no query
pub fn json_body<T: Default>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(AppError::Validation {
            message: rejection.body_text(),
        }),
    }
}
