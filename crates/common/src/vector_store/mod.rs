//! Vector store client
//!
//! Talks to a Pinecone index data plane: nearest-neighbour queries for the RAG
//! assembler and vector upserts for loading documents. Document text lives in
//! the match metadata under a configurable key.

use crate::config::{http_client, VectorStoreConfig};
use crate::errors::{describe_http_error, AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;

const API_VERSION: &str = "2024-07";

/// Document returned by a similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    pub score: f32,
    pub page_content: String,
    pub metadata: Map<String, Value>,
}

/// Vector to insert into the index
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// Nearest-neighbour store over embeddings
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Find the `top_k` documents closest to `vector`
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedDocument>>;

    /// Insert or overwrite vectors, returning how many were written
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize>;
}

/// Pinecone data-plane client
pub struct PineconeStore {
    client: reqwest::Client,
    api_key: String,
    host: String,
    namespace: Option<String>,
    text_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

impl PineconeStore {
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
            message: "vector_store.api_key is required".to_string(),
        })?;
        let host = config.index_host.clone().ok_or_else(|| AppError::Configuration {
            message: "vector_store.index_host is required".to_string(),
        })?;

        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key,
            host: host.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone().filter(|ns| !ns.is_empty()),
            text_key: config.text_key.clone(),
        })
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::VectorStore {
                message: format!("Request failed: {}", describe_http_error(&e)),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::VectorStore {
                message: format!("API error {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| AppError::VectorStore {
            message: format!("Failed to parse response: {}", e),
        })
    }

    fn to_document(&self, found: QueryMatch) -> RetrievedDocument {
        let mut metadata = found.metadata.unwrap_or_default();
        let page_content = match metadata.remove(&self.text_key) {
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        RetrievedDocument {
            id: found.id,
            score: found.score,
            page_content,
            metadata,
        }
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedDocument>> {
        let start = Instant::now();
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let result: Result<QueryResponse> = self.post("/query", &request).await;
        crate::metrics::record_backend_call(
            "vector_store",
            start.elapsed().as_secs_f64(),
            result.is_ok(),
        );

        Ok(result?
            .matches
            .into_iter()
            .map(|found| self.to_document(found))
            .collect())
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let request = UpsertRequest {
            vectors: records,
            namespace: self.namespace.as_deref(),
        };
        let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;

        tracing::debug!(count = response.upserted_count, "Vectors upserted");
        Ok(response.upserted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_stub;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    fn config(host: String) -> VectorStoreConfig {
        VectorStoreConfig {
            api_key: Some("pc-test".into()),
            index_host: Some(host),
            namespace: Some("papers".into()),
            ..VectorStoreConfig::default()
        }
    }

    #[tokio::test]
    async fn test_query_maps_text_metadata() {
        let app = Router::new().route(
            "/query",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["api-key"], "pc-test");
                assert_eq!(body["topK"], 4);
                assert_eq!(body["includeMetadata"], true);
                assert_eq!(body["namespace"], "papers");
                Json(json!({
                    "matches": [
                        { "id": "doc-1", "score": 0.91, "metadata": { "text": "Self-attention", "source": "a.md" } },
                        { "id": "doc-2", "score": 0.72 }
                    ],
                    "namespace": "papers"
                }))
            }),
        );
        let host = spawn_stub(app).await;
        let store = PineconeStore::new(&config(host)).unwrap();

        let docs = store.query(&[0.1, 0.2], 4).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].page_content, "Self-attention");
        assert_eq!(docs[0].metadata["source"], "a.md");
        assert!(!docs[0].metadata.contains_key("text"));
        assert_eq!(docs[1].page_content, "");
    }

    #[tokio::test]
    async fn test_query_error_status() {
        let app = Router::new().route(
            "/query",
            post(|| async { (StatusCode::FORBIDDEN, "denied") }),
        );
        let host = spawn_stub(app).await;
        let store = PineconeStore::new(&config(host)).unwrap();

        let err = store.query(&[0.1], 4).await.unwrap_err();
        assert!(matches!(err, AppError::VectorStore { .. }));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_upsert_reports_count() {
        let app = Router::new().route(
            "/vectors/upsert",
            post(|Json(body): Json<Value>| async move {
                let count = body["vectors"].as_array().map(|v| v.len()).unwrap_or(0);
                Json(json!({ "upsertedCount": count }))
            }),
        );
        let host = spawn_stub(app).await;
        let store = PineconeStore::new(&config(host)).unwrap();

        let mut metadata = Map::new();
        metadata.insert("text".into(), json!("chunk"));
        let records = vec![
            VectorRecord { id: "a".into(), values: vec![0.1, 0.2], metadata },
            VectorRecord { id: "b".into(), values: vec![0.3, 0.4], metadata: Map::new() },
        ];

        assert_eq!(store.upsert(&records).await.unwrap(), 2);
        assert_eq!(store.upsert(&[]).await.unwrap(), 0);
    }

    #[test]
    fn test_bare_host_gets_scheme() {
        let store = PineconeStore::new(&config("md-text-abc.svc.pinecone.io/".into())).unwrap();
        assert_eq!(store.host, "https://md-text-abc.svc.pinecone.io");
    }
}
