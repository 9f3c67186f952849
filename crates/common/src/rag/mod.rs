//! Retrieval-augmented answer assembly
//!
//! A query is embedded, the nearest documents are fetched from the vector
//! store, and query plus documents are folded into a single prompt for the
//! chat-completion endpoint. Retrieval problems degrade to an empty document
//! list; generation problems fail the request.

mod generator;

pub use generator::{ChatClient, ChatCompleter, SamplingParams};

use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::vector_store::{RetrievedDocument, VectorStore};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Answers a query from retrieved documents
#[async_trait]
pub trait RagSearch: Send + Sync {
    /// Returns the completion object produced by the generation endpoint
    async fn answer(&self, query: &str) -> Result<Value>;
}

/// Render retrieved documents as the prompt's document list
pub fn render_documents(documents: &[RetrievedDocument]) -> String {
    let rendered: Vec<String> = documents
        .iter()
        .map(|doc| {
            format!(
                "Document(page_content={:?}, metadata={})",
                doc.page_content,
                Value::Object(doc.metadata.clone())
            )
        })
        .collect();

    format!("[{}]", rendered.join(", "))
}

/// Build the generation prompt
pub fn build_prompt(query: &str, documents: &[RetrievedDocument]) -> String {
    format!("Query: {}\nText Documents: {}", query, render_documents(documents))
}

/// Embeds, retrieves and generates
pub struct RagAssembler {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    generator: Arc<dyn ChatCompleter>,
    top_k: usize,
    params: SamplingParams,
}

impl RagAssembler {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn ChatCompleter>,
        top_k: usize,
        params: SamplingParams,
    ) -> Self {
        tracing::debug!(
            embedding_model = %embedder.model_name(),
            dimension = embedder.dimension(),
            top_k,
            "RAG assembler configured"
        );

        Self {
            embedder,
            store,
            generator,
            top_k,
            params,
        }
    }

    /// Fetch the nearest documents; any failure yields an empty list
    pub async fn retrieve(&self, query: &str) -> Vec<RetrievedDocument> {
        let documents = match self.embedder.embed(query).await {
            Ok(vector) => self.store.query(&vector, self.top_k).await,
            Err(e) => Err(e),
        };

        let documents = match documents {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!(error = %e, "Retrieval failed, continuing without documents");
                Vec::new()
            }
        };

        if documents.is_empty() {
            tracing::warn!("No relevant text documents found for the query");
        } else {
            tracing::info!(count = documents.len(), "Retrieved relevant text documents");
        }
        crate::metrics::record_retrieval(documents.len());

        documents
    }
}

#[async_trait]
impl RagSearch for RagAssembler {
    async fn answer(&self, query: &str) -> Result<Value> {
        tracing::info!(query = %query, "Performing RAG search");

        let documents = self.retrieve(query).await;
        let prompt = build_prompt(query, &documents);

        self.generator.complete(&prompt, self.params).await
    }
}
