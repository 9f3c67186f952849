//! Search backend adapters
//!
//! Each adapter wraps one external search API and normalizes its response
//! into the shapes below. Transport failures come back as [`AppError`]
//! values carrying the adapter's own message prefix.
//!
//! [`AppError`]: crate::errors::AppError

mod arxiv;
mod web;

pub use arxiv::{parse_feed, ArxivClient};
pub use web::{build_context, TavilyClient};

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message returned when a paper search matched nothing
pub const NO_PAPERS_MESSAGE: &str = "No papers found matching your query.";

/// A normalized paper search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub published: String,
    /// Canonical abstract page
    pub link: String,
    /// First link typed as `pdf`, if the entry has one
    pub pdf_url: Option<String>,
}

/// Result of a paper search that reached the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaperSearchOutcome {
    Results { results: Vec<Paper> },
    Empty { message: String },
}

impl PaperSearchOutcome {
    /// Wrap normalized papers, using the empty-result message when there are none
    pub fn from_papers(papers: Vec<Paper>) -> Self {
        if papers.is_empty() {
            PaperSearchOutcome::Empty {
                message: NO_PAPERS_MESSAGE.to_string(),
            }
        } else {
            PaperSearchOutcome::Results { results: papers }
        }
    }

    pub fn papers(&self) -> &[Paper] {
        match self {
            PaperSearchOutcome::Results { results } => results,
            PaperSearchOutcome::Empty { .. } => &[],
        }
    }
}

/// Context string produced by the web search backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebContext {
    pub context: String,
}

/// Academic paper search backend
#[async_trait]
pub trait PaperSearch: Send + Sync {
    async fn search_papers(&self, query: &str) -> Result<PaperSearchOutcome>;
}

/// Web search-context backend
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search_web(&self, query: &str) -> Result<WebContext>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_outcome_shape() {
        let outcome = PaperSearchOutcome::from_papers(Vec::new());
        assert!(outcome.papers().is_empty());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "message": "No papers found matching your query." })
        );
    }

    #[test]
    fn test_results_outcome_shape() {
        let paper = Paper {
            title: "Attention Is All You Need".into(),
            summary: "Transformers.".into(),
            authors: vec!["Ashish Vaswani".into()],
            published: "2017-06-12T17:57:34Z".into(),
            link: "http://arxiv.org/abs/1706.03762v7".into(),
            pdf_url: None,
        };
        let value = serde_json::to_value(PaperSearchOutcome::from_papers(vec![paper])).unwrap();
        assert_eq!(value["results"][0]["authors"], json!(["Ashish Vaswani"]));
        assert!(value["results"][0]["pdf_url"].is_null());
        assert!(value.get("message").is_none());
    }
}
