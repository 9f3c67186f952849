//! Keyword routing handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use super::{json_body, MAX_QUERY_CHARS};
use crate::AppState;
use paperlane_common::{
    errors::{AppError, Result},
    Message, RouteOutcome,
};

/// Route request: a bare query, a conversation, or both
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RouteRequest {
    #[serde(default)]
    #[validate(length(max = MAX_QUERY_CHARS))]
    pub query: Option<String>,

    #[serde(default)]
    pub messages: Vec<Message>,
}

impl RouteRequest {
    /// The conversation to route, with `query` appended as the newest user turn
    pub fn into_conversation(self) -> Result<Vec<Message>> {
        self.validate().map_err(|e| AppError::Validation {
            message: e.to_string(),
        })?;

        let mut conversation = self.messages;
        if let Some(query) = self.query.filter(|q| !q.trim().is_empty()) {
            conversation.push(Message::user(query));
        }
        Ok(conversation)
    }
}

/// Hand the latest message to the backend its keywords select
#[instrument(skip_all)]
pub async fn route_query(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<RouteOutcome>> {
    let conversation = json_body(payload)?.into_conversation()?;

    let outcome = state.router.route(conversation).await?;

    Ok(Json(outcome))
}
