//! Configuration management for PaperLane services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - The well-known secret variables of a deployment (PINECONE_API_KEY, ...)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Well-known environment variables mapped onto config keys.
///
/// These act as defaults, so `APP__...` variables and config files win.
pub const SECRET_ENV_FALLBACKS: &[(&str, &str)] = &[
    ("PINECONE_API_KEY", "vector_store.api_key"),
    ("PINECONE_INDEX_HOST", "vector_store.index_host"),
    ("TAVILY_API_KEY", "web_search.api_key"),
    ("NVIDIA_API_KEY", "generation.api_key"),
    ("OPENAI_API_KEY", "embedding.api_key"),
];

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Paper search (arXiv) configuration
    #[serde(default)]
    pub arxiv: ArxivConfig,

    /// Web search (Tavily) configuration
    #[serde(default)]
    pub web_search: WebSearchConfig,

    /// Vector store (Pinecone) configuration
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Text generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum concurrent requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArxivConfig {
    /// Query endpoint of the arXiv export API
    #[serde(default = "default_arxiv_url")]
    pub api_url: String,

    /// Number of most relevant entries to request
    #[serde(default = "default_arxiv_max_results")]
    pub max_results: u32,

    /// Request timeout in seconds
    #[serde(default = "default_outbound_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebSearchConfig {
    /// API key for the search-context service
    pub api_key: Option<String>,

    /// Search endpoint
    #[serde(default = "default_web_search_url")]
    pub api_url: String,

    /// Results requested per search
    #[serde(default = "default_web_max_results")]
    pub max_results: u32,

    /// Search depth: basic or advanced
    #[serde(default = "default_search_depth")]
    pub search_depth: String,

    /// Token budget for the assembled context string
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Request timeout in seconds
    #[serde(default = "default_outbound_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VectorStoreConfig {
    /// API key for the vector store
    pub api_key: Option<String>,

    /// Data-plane URL of the text index
    pub index_host: Option<String>,

    /// Namespace inside the index
    pub namespace: Option<String>,

    /// Nearest neighbours fetched per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Metadata key holding the document text
    #[serde(default = "default_text_key")]
    pub text_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_outbound_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// API key for embedding service
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_embedding_base")]
    pub api_base: String,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_outbound_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// API key for the chat-completion service
    pub api_key: Option<String>,

    /// API base URL (OpenAI-compatible)
    #[serde(default = "default_generation_base")]
    pub api_base: String,

    /// Model to use
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default)]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_request_timeout() -> u64 { 150 }
fn default_max_concurrent() -> usize { 100 }
fn default_outbound_timeout() -> u64 { 30 }
fn default_arxiv_url() -> String { "http://export.arxiv.org/api/query".to_string() }
fn default_arxiv_max_results() -> u32 { 5 }
fn default_web_search_url() -> String { "https://api.tavily.com/search".to_string() }
fn default_web_max_results() -> u32 { 5 }
fn default_search_depth() -> String { "basic".to_string() }
fn default_max_context_tokens() -> usize { 4000 }
fn default_top_k() -> usize { 4 }
fn default_text_key() -> String { "text".to_string() }
fn default_embedding_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_embedding_model() -> String { "text-embedding-ada-002".to_string() }
fn default_embedding_dimension() -> usize { 1536 }
fn default_generation_base() -> String { "https://integrate.api.nvidia.com/v1".to_string() }
fn default_generation_model() -> String { "meta/llama3-8b-instruct".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 200 }
fn default_generation_timeout() -> u64 { 60 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "paperlane".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            api_url: default_arxiv_url(),
            max_results: default_arxiv_max_results(),
            timeout_secs: default_outbound_timeout(),
        }
    }
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_web_search_url(),
            max_results: default_web_max_results(),
            search_depth: default_search_depth(),
            max_context_tokens: default_max_context_tokens(),
            timeout_secs: default_outbound_timeout(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_host: None,
            namespace: None,
            top_k: default_top_k(),
            text_key: default_text_key(),
            timeout_secs: default_outbound_timeout(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_embedding_base(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_outbound_timeout(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_generation_base(),
            model: default_generation_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = with_secret_fallbacks(Config::builder())?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        let config = with_secret_fallbacks(Config::builder())?
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check that every secret and bound needed to serve is present.
    ///
    /// A missing secret is a startup failure, never a per-request one.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("vector_store.api_key", "PINECONE_API_KEY", &self.vector_store.api_key),
            ("vector_store.index_host", "PINECONE_INDEX_HOST", &self.vector_store.index_host),
            ("web_search.api_key", "TAVILY_API_KEY", &self.web_search.api_key),
            ("generation.api_key", "NVIDIA_API_KEY", &self.generation.api_key),
            ("embedding.api_key", "OPENAI_API_KEY", &self.embedding.api_key),
        ];

        let missing: Vec<String> = required
            .iter()
            .filter(|(_, _, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(key, env, _)| format!("{} ({})", key, env))
            .collect();

        if !missing.is_empty() {
            return Err(AppError::Configuration {
                message: format!("missing required settings: {}", missing.join(", ")),
            });
        }

        if self.vector_store.top_k == 0 {
            return Err(AppError::Configuration {
                message: "vector_store.top_k must be at least 1".to_string(),
            });
        }

        if self.generation.max_tokens == 0 {
            return Err(AppError::Configuration {
                message: "generation.max_tokens must be at least 1".to_string(),
            });
        }

        // A RAG answer chains all three outbound calls under one request.
        let rag_chain = self.embedding.timeout_secs
            + self.vector_store.timeout_secs
            + self.generation.timeout_secs;
        if self.server.request_timeout_secs <= rag_chain {
            return Err(AppError::Configuration {
                message: format!(
                    "server.request_timeout_secs ({}) must exceed the embedding, vector_store and generation timeouts combined ({})",
                    self.server.request_timeout_secs, rag_chain
                ),
            });
        }

        Ok(())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn with_secret_fallbacks(
    mut builder: ConfigBuilder<DefaultState>,
) -> std::result::Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in SECRET_ENV_FALLBACKS {
        if let Ok(value) = std::env::var(var) {
            builder = builder.set_default(*key, value)?;
        }
    }
    Ok(builder)
}

/// Build a reqwest client carrying the given timeout
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.vector_store.api_key = Some("pc-key".into());
        config.vector_store.index_host = Some("https://md-text.svc.pinecone.io".into());
        config.web_search.api_key = Some("tvly-key".into());
        config.generation.api_key = Some("nv-key".into());
        config.embedding.api_key = Some("sk-key".into());
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.request_timeout_secs, 150);
        assert_eq!(config.arxiv.max_results, 5);
        assert_eq!(config.vector_store.top_k, 4);
        assert_eq!(config.generation.max_tokens, 200);
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.embedding.model, "text-embedding-ada-002");
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        tokio_test::assert_ok!(complete_config().validate());
    }

    #[test]
    fn test_validate_names_missing_secrets() {
        let mut config = complete_config();
        config.web_search.api_key = None;
        config.generation.api_key = Some("   ".into());

        let err = config.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("TAVILY_API_KEY"));
        assert!(message.contains("NVIDIA_API_KEY"));
        assert!(!message.contains("PINECONE_API_KEY"));
    }

    #[test]
    fn test_validate_rejects_request_timeout_below_rag_chain() {
        let mut config = complete_config();
        config.server.request_timeout_secs = 120;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.request_timeout_secs (120)"));

        config.server.request_timeout_secs = 121;
        tokio_test::assert_ok!(config.validate());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = complete_config();
        config.vector_store.top_k = 0;
        tokio_test::assert_err!(config.validate());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                "[vector_store]\napi_key = \"abc\"\ntop_k = 8\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.vector_store.api_key.as_deref(), Some("abc"));
        assert_eq!(config.vector_store.top_k, 8);
        assert_eq!(config.vector_store.text_key, "text");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_shipped_defaults_match_code() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                include_str!("../../../../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let defaults = AppConfig::default();

        assert_eq!(config.bind_address(), defaults.bind_address());
        assert_eq!(config.arxiv.api_url, defaults.arxiv.api_url);
        assert_eq!(config.vector_store.top_k, defaults.vector_store.top_k);
        assert_eq!(config.generation.model, defaults.generation.model);
        assert_eq!(config.rate_limit.burst, defaults.rate_limit.burst);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }
}
