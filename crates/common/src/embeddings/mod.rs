//! Embedding service abstraction
//!
//! Text is projected into the vector space of the RAG index through an
//! OpenAI-compatible `/embeddings` endpoint (text-embedding-ada-002, 1536-d).

use crate::config::{http_client, EmbeddingConfig};
use crate::errors::{describe_http_error, AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Trait for embedding generation
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;
}

/// OpenAI embedding client
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimension: usize,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f32>,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder from its config section
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
            message: "embedding.api_key is required".to_string(),
        })?;

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key,
            model: config.model.clone(),
            dimension: config.dimension,
            base_url: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn make_request(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);

        let request = OpenAIRequest {
            input: [text],
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding {
                message: format!("Request failed: {}", describe_http_error(&e)),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: OpenAIResponse = response.json().await.map_err(|e| AppError::Embedding {
            message: format!("Failed to parse response: {}", e),
        })?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .map(|e| e.embedding)
            .ok_or_else(|| AppError::Embedding {
                message: "Empty response".to_string(),
            })?;

        if embedding.len() != self.dimension {
            return Err(AppError::Embedding {
                message: format!(
                    "Expected {}-d embedding from {}, got {}",
                    self.dimension,
                    self.model,
                    embedding.len()
                ),
            });
        }

        Ok(embedding)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let result = self.make_request(text).await;
        crate::metrics::record_backend_call(
            "embedding",
            start.elapsed().as_secs_f64(),
            result.is_ok(),
        );
        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_stub;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn config(base: String, dimension: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            api_key: Some("sk-test".into()),
            api_base: base,
            dimension,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_embed_parses_first_vector() {
        let app = Router::new().route(
            "/embeddings",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "text-embedding-ada-002");
                assert_eq!(body["input"][0], "attention");
                Json(json!({ "data": [{ "embedding": [0.1, 0.2, 0.3] }] }))
            }),
        );
        let base = spawn_stub(app).await;

        let embedder = OpenAIEmbedder::new(&config(base, 3)).unwrap();
        let embedding = embedder.embed("attention").await.unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
        assert_eq!(embedder.dimension(), 3);
        assert_eq!(embedder.model_name(), "text-embedding-ada-002");
    }

    #[tokio::test]
    async fn test_embed_rejects_wrong_dimension() {
        let app = Router::new().route(
            "/embeddings",
            post(|| async { Json(json!({ "data": [{ "embedding": [0.1, 0.2] }] })) }),
        );
        let base = spawn_stub(app).await;

        let embedder = OpenAIEmbedder::new(&config(base, 1536)).unwrap();
        let err = embedder.embed("x").await.unwrap_err();
        assert!(err.to_string().contains("1536-d"));
    }

    #[tokio::test]
    async fn test_embed_surfaces_api_status() {
        let app = Router::new().route(
            "/embeddings",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = spawn_stub(app).await;

        let embedder = OpenAIEmbedder::new(&config(base, 3)).unwrap();
        let err = embedder.embed("x").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding { .. }));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_new_requires_key() {
        let config = EmbeddingConfig::default();
        assert!(OpenAIEmbedder::new(&config).is_err());
    }
}
