//! arXiv paper search adapter
//!
//! Queries the arXiv export API for the most relevant entries and normalizes
//! the Atom feed into [`Paper`] values.

use super::{Paper, PaperSearch, PaperSearchOutcome};
use crate::config::{http_client, ArxivConfig};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

/// arXiv export API client
pub struct ArxivClient {
    client: reqwest::Client,
    api_url: String,
    max_results: u32,
}

// Atom feed, reduced to the fields we read. A lone <entry>, <author> or
// <link> deserializes as a one-element Vec.
#[derive(Debug, Default, Deserialize)]
struct Feed {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
struct Entry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    published: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    author: Vec<Author>,
    #[serde(default)]
    link: Vec<Link>,
}

#[derive(Debug, Default, Deserialize)]
struct Author {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Link {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@title", default)]
    title: Option<String>,
}

impl From<Entry> for Paper {
    fn from(entry: Entry) -> Self {
        let pdf_url = entry
            .link
            .into_iter()
            .find(|link| link.title.as_deref() == Some("pdf"))
            .map(|link| link.href);

        Paper {
            title: flatten_text(&entry.title),
            summary: flatten_text(&entry.summary),
            authors: entry.author.into_iter().map(|a| a.name).collect(),
            published: entry.published,
            link: entry.id,
            pdf_url,
        }
    }
}

fn flatten_text(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}

/// Parse an arXiv Atom feed into normalized papers
pub fn parse_feed(xml: &str) -> Result<Vec<Paper>> {
    let feed: Feed = quick_xml::de::from_str(xml)?;
    Ok(feed.entry.into_iter().map(Paper::from).collect())
}

impl ArxivClient {
    pub fn new(config: &ArxivConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_url: config.api_url.clone(),
            max_results: config.max_results,
        })
    }

    async fn fetch(&self, query: &str) -> Result<PaperSearchOutcome> {
        let params = [
            ("search_query", format!("all:{}", query)),
            ("start", "0".to_string()),
            ("max_results", self.max_results.to_string()),
            ("sortBy", "relevance".to_string()),
            ("sortOrder", "descending".to_string()),
        ];

        let response = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ArxivStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let papers = parse_feed(&body)?;

        Ok(PaperSearchOutcome::from_papers(papers))
    }
}

#[async_trait]
impl PaperSearch for ArxivClient {
    async fn search_papers(&self, query: &str) -> Result<PaperSearchOutcome> {
        let start = Instant::now();

        let result = self.fetch(query).await.map_err(|e| match e {
            AppError::ArxivStatus { .. } => e,
            other => AppError::PaperSearch {
                message: other.to_string(),
            },
        });

        let latency_ms = start.elapsed().as_millis() as u64;
        crate::metrics::record_backend_call("arxiv", start.elapsed().as_secs_f64(), result.is_ok());

        match &result {
            Ok(outcome) => tracing::info!(
                query = %query,
                results = outcome.papers().len(),
                latency_ms,
                "Paper search completed"
            ),
            Err(e) => tracing::error!(query = %query, error = %e, latency_ms, "Error in paper search"),
        }

        result
    }
}
