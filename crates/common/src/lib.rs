//! PaperLane Common Library
//!
//! Shared code for the PaperLane gateway:
//! - Configuration management
//! - Error types and the `{"error": ...}` payload
//! - Paper search and web search adapters
//! - Embedding and vector store clients
//! - Retrieval-augmented answer assembly
//! - Keyword query routing
//! - Metrics helpers

pub mod backends;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod metrics;
pub mod rag;
pub mod router;
pub mod search;
pub mod vector_store;

// Re-export commonly used types
pub use backends::Backends;
pub use config::AppConfig;
pub use errors::{AppError, ErrorPayload, Result};
pub use router::{select_backend, Backend, Message, QueryRouter, RouteOutcome};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
