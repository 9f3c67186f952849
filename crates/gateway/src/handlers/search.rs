//! Search handlers

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::instrument;

use super::{json_body, QueryRequest};
use crate::AppState;
use paperlane_common::{
    errors::Result,
    search::{PaperSearchOutcome, WebContext},
};

/// Search arXiv for the most relevant papers
#[instrument(skip_all)]
pub async fn search_papers(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<PaperSearchOutcome>> {
    let query = json_body(payload)?.require_query()?;

    let outcome = state.backends.papers.search_papers(&query).await?;

    Ok(Json(outcome))
}

/// Build a web search context for the query
#[instrument(skip_all)]
pub async fn search_web(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<WebContext>> {
    let query = json_body(payload)?.require_query()?;

    let context = state.backends.web.search_web(&query).await?;

    Ok(Json(context))
}
