//! Chat-completion client for answer generation
//!
//! Any OpenAI-compatible `/chat/completions` endpoint works; the default
//! deployment points at a hosted Llama 3 model.

use crate::config::{http_client, GenerationConfig};
use crate::errors::{describe_http_error, AppError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// Sampling parameters sent with every completion request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 200,
        }
    }
}

/// Single-turn text generation
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Send `prompt` as one user message and return the completion object as received
    async fn complete(&self, prompt: &str, params: SamplingParams) -> Result<Value>;
}

/// OpenAI-compatible chat-completion client
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
            message: "generation.api_key is required".to_string(),
        })?;

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }

    async fn call_llm(&self, prompt: &str, params: SamplingParams) -> Result<Value> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation {
                message: format!("LLM API request failed: {}", describe_http_error(&e)),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation {
                message: format!("LLM API error {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| AppError::Generation {
            message: format!("Failed to parse LLM response: {}", e),
        })
    }
}

#[async_trait]
impl ChatCompleter for ChatClient {
    async fn complete(&self, prompt: &str, params: SamplingParams) -> Result<Value> {
        let preview: String = prompt.chars().take(50).collect();
        tracing::info!(model = %self.model, prompt = %preview, "Calling text generation API");

        let start = Instant::now();
        let result = self.call_llm(prompt, params).await;
        crate::metrics::record_backend_call(
            "generation",
            start.elapsed().as_secs_f64(),
            result.is_ok(),
        );

        if let Err(e) = &result {
            tracing::error!(error = %e, "Failed to call text generation API");
        }
        result
    }
}
