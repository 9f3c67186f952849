//! Retrieval-augmented answer handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use tracing::instrument;

use super::{json_body, QueryRequest};
use crate::AppState;
use paperlane_common::errors::Result;

/// Answer the query from the vector index, returning the raw completion
#[instrument(skip_all)]
pub async fn rag_search(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let query = json_body(payload)?.require_query()?;

    let completion = state.backends.rag.answer(&query).await?;

    Ok(Json(completion))
}
