//! Web search adapter (Tavily search-context API)

use super::{WebContext, WebSearch};
use crate::config::{http_client, WebSearchConfig};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Tavily search client
pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    max_results: u32,
    search_depth: String,
    max_context_tokens: usize,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    topic: &'static str,
    max_results: u32,
    include_answer: bool,
    include_raw_content: bool,
    include_images: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct ContextSource<'a> {
    url: &'a str,
    content: &'a str,
}

/// Render sources as a JSON list of `{url, content}`, keeping the longest
/// prefix of sources whose estimated token count fits `max_tokens`.
///
/// Tokens are estimated at four characters each.
pub fn build_context<'a, I>(sources: I, max_tokens: usize) -> Result<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let budget = max_tokens.saturating_mul(4);
    let mut used = 0usize;
    let mut kept = Vec::new();

    for (url, content) in sources {
        let source = ContextSource { url, content };
        let size = serde_json::to_string(&source)?.chars().count();
        if used + size > budget {
            break;
        }
        used += size;
        kept.push(source);
    }

    Ok(serde_json::to_string(&kept)?)
}

impl TavilyClient {
    pub fn new(config: &WebSearchConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
            message: "web_search.api_key is required".to_string(),
        })?;

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key,
            api_url: config.api_url.clone(),
            max_results: config.max_results,
            search_depth: config.search_depth.clone(),
            max_context_tokens: config.max_context_tokens,
        })
    }

    async fn fetch(&self, query: &str) -> Result<WebContext> {
        let request = SearchRequest {
            query,
            search_depth: &self.search_depth,
            topic: "general",
            max_results: self.max_results,
            include_answer: false,
            include_raw_content: false,
            include_images: false,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::WebSearch {
                message: format!("status {}: {}", status, body),
            });
        }

        let payload: SearchResponse = response.json().await?;
        let context = build_context(
            payload
                .results
                .iter()
                .map(|hit| (hit.url.as_str(), hit.content.as_str())),
            self.max_context_tokens,
        )?;

        Ok(WebContext { context })
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    async fn search_web(&self, query: &str) -> Result<WebContext> {
        let start = Instant::now();

        let result = self.fetch(query).await.map_err(|e| match e {
            AppError::WebSearch { .. } => e,
            other => AppError::WebSearch {
                message: other.to_string(),
            },
        });

        crate::metrics::record_backend_call("web", start.elapsed().as_secs_f64(), result.is_ok());
        match &result {
            Ok(found) => tracing::info!(
                query = %query,
                context_chars = found.context.len(),
                "Web search completed"
            ),
            Err(e) => tracing::error!(query = %query, error = %e, "Error in web search"),
        }

        result
    }
}
