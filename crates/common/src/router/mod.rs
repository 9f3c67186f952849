//! Keyword query router
//!
//! Looks at the latest message of a conversation and hands it to exactly one
//! backend. Selection is a pure function of the message text so the priority
//! rules can be checked on their own: `arxiv` beats `rag`, which beats `web`;
//! anything else passes the conversation through untouched.

use crate::backends::Backends;
use crate::errors::{AppError, Result};
use crate::search::{PaperSearchOutcome, WebContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Backend chosen for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    PaperSearch,
    RagSearch,
    WebSearch,
    Passthrough,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::PaperSearch => "paper_search",
            Backend::RagSearch => "rag_search",
            Backend::WebSearch => "web_search",
            Backend::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Checked in order; first hit wins.
const KEYWORDS: &[(&str, Backend)] = &[
    ("arxiv", Backend::PaperSearch),
    ("rag", Backend::RagSearch),
    ("web", Backend::WebSearch),
];

/// Pick the backend for a message text
pub fn select_backend(text: &str) -> Backend {
    let text = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, backend)| *backend)
        .unwrap_or(Backend::Passthrough)
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

fn default_role() -> String {
    "user".to_string()
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: default_role(),
            content: content.into(),
        }
    }
}

/// Whatever the selected branch produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RouteOutcome {
    Papers(PaperSearchOutcome),
    Answer(Value),
    Web(WebContext),
    Passthrough { messages: Vec<Message> },
}

/// Dispatches a conversation to one backend
#[derive(Clone)]
pub struct QueryRouter {
    backends: Backends,
}

impl QueryRouter {
    pub fn new(backends: Backends) -> Self {
        Self { backends }
    }

    /// Route on the latest message. An empty conversation or a blank latest
    /// message is treated as a missing query.
    pub async fn route(&self, messages: Vec<Message>) -> Result<RouteOutcome> {
        let query = match messages.last() {
            Some(last) if !last.content.trim().is_empty() => last.content.clone(),
            _ => return Err(AppError::MissingQuery),
        };

        let backend = select_backend(&query);
        crate::metrics::record_route(backend.as_str());
        tracing::info!(backend = %backend, query = %query, "Routing query");

        let outcome = match backend {
            Backend::PaperSearch => {
                RouteOutcome::Papers(self.backends.papers.search_papers(&query).await?)
            }
            Backend::RagSearch => RouteOutcome::Answer(self.backends.rag.answer(&query).await?),
            Backend::WebSearch => RouteOutcome::Web(self.backends.web.search_web(&query).await?),
            Backend::Passthrough => RouteOutcome::Passthrough { messages },
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::tests::{fake_backends, Calls};
    use serde_json::json;

    #[test]
    fn test_single_keywords() {
        assert_eq!(select_backend("find arxiv papers on diffusion"), Backend::PaperSearch);
        assert_eq!(select_backend("use rag to answer"), Backend::RagSearch);
        assert_eq!(select_backend("search the web for tokio"), Backend::WebSearch);
        assert_eq!(select_backend("hello there"), Backend::Passthrough);
        assert_eq!(select_backend(""), Backend::Passthrough);
    }

    #[test]
    fn test_case_insensitive_substrings() {
        assert_eq!(select_backend("ARXIV:2401.00001"), Backend::PaperSearch);
        assert_eq!(select_backend("Storage layers"), Backend::RagSearch);
        assert_eq!(select_backend("WebAssembly runtimes"), Backend::WebSearch);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(select_backend("web rag arxiv"), Backend::PaperSearch);
        assert_eq!(select_backend("the web of citations via rag"), Backend::RagSearch);
        assert_eq!(select_backend("web search, not arx iv"), Backend::WebSearch);
    }

    #[tokio::test]
    async fn test_routes_latest_message_only() {
        let (backends, calls) = fake_backends();
        let router = QueryRouter::new(backends);

        let outcome = router
            .route(vec![Message::user("arxiv first"), Message::user("now the web")])
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RouteOutcome::Web(WebContext { context: "context for now the web".into() })
        );
        assert_eq!(calls.snapshot(), Calls { papers: 0, rag: 0, web: 1 });
    }

    #[tokio::test]
    async fn test_each_branch_runs_exactly_one_backend() {
        let (backends, calls) = fake_backends();
        let router = QueryRouter::new(backends);

        let papers = router.route(vec![Message::user("arxiv transformers")]).await.unwrap();
        assert_eq!(papers.papers_len(), Some(1));

        let answer = router.route(vec![Message::user("rag: what is attention")]).await.unwrap();
        assert_eq!(answer, RouteOutcome::Answer(json!({ "answer": "rag: what is attention" })));

        assert_eq!(calls.snapshot(), Calls { papers: 1, rag: 1, web: 0 });
    }

    #[tokio::test]
    async fn test_passthrough_returns_conversation() {
        let (backends, calls) = fake_backends();
        let router = QueryRouter::new(backends);
        let conversation = vec![
            Message { role: "system".into(), content: "be brief".into() },
            Message::user("hello"),
        ];

        let outcome = router.route(conversation.clone()).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Passthrough { messages: conversation });
        assert_eq!(calls.snapshot(), Calls::default());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap()["messages"][1]["content"],
            "hello"
        );
    }

    #[tokio::test]
    async fn test_blank_conversation_is_missing_query() {
        let (backends, calls) = fake_backends();
        let router = QueryRouter::new(backends);

        assert!(matches!(router.route(Vec::new()).await, Err(AppError::MissingQuery)));
        assert!(matches!(
            router.route(vec![Message::user("  ")]).await,
            Err(AppError::MissingQuery)
        ));
        assert_eq!(calls.snapshot(), Calls::default());
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let (backends, _) = fake_backends();
        let router = QueryRouter::new(backends);

        let err = router.route(vec![Message::user("web fail")]).await.unwrap_err();
        assert_eq!(err.to_payload().error, "An error occurred during web search: fail");
    }

    impl RouteOutcome {
        fn papers_len(&self) -> Option<usize> {
            match self {
                RouteOutcome::Papers(outcome) => Some(outcome.papers().len()),
                _ => None,
            }
        }
    }
}
