//! Client bundle handed to the router and the endpoint surface
//!
//! Built once at start-up from [`AppConfig`] and shared read-only; tests
//! substitute their own implementations of each backend trait.

use crate::config::AppConfig;
use crate::embeddings::OpenAIEmbedder;
use crate::errors::Result;
use crate::rag::{ChatClient, RagAssembler, RagSearch, SamplingParams};
use crate::search::{ArxivClient, PaperSearch, TavilyClient, WebSearch};
use crate::vector_store::PineconeStore;
use std::sync::Arc;

/// The three search backends
#[derive(Clone)]
pub struct Backends {
    pub papers: Arc<dyn PaperSearch>,
    pub web: Arc<dyn WebSearch>,
    pub rag: Arc<dyn RagSearch>,
}

impl Backends {
    pub fn new(
        papers: Arc<dyn PaperSearch>,
        web: Arc<dyn WebSearch>,
        rag: Arc<dyn RagSearch>,
    ) -> Self {
        Self { papers, web, rag }
    }

    /// Build the production clients. Fails on any missing secret.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let papers = Arc::new(ArxivClient::new(&config.arxiv)?);
        let web = Arc::new(TavilyClient::new(&config.web_search)?);

        let rag = RagAssembler::new(
            Arc::new(OpenAIEmbedder::new(&config.embedding)?),
            Arc::new(PineconeStore::new(&config.vector_store)?),
            Arc::new(ChatClient::new(&config.generation)?),
            config.vector_store.top_k,
            SamplingParams {
                temperature: config.generation.temperature,
                max_tokens: config.generation.max_tokens,
            },
        );

        tracing::info!(
            arxiv = %config.arxiv.api_url,
            web = %config.web_search.api_url,
            generation_model = %config.generation.model,
            top_k = config.vector_store.top_k,
            "Backends initialized"
        );

        Ok(Self::new(papers, web, Arc::new(rag)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::search::{Paper, PaperSearchOutcome, WebContext};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Calls {
        pub papers: usize,
        pub rag: usize,
        pub web: usize,
    }

    #[derive(Default)]
    pub(crate) struct CallCounter {
        papers: AtomicUsize,
        rag: AtomicUsize,
        web: AtomicUsize,
    }

    impl CallCounter {
        pub(crate) fn snapshot(&self) -> Calls {
            Calls {
                papers: self.papers.load(Ordering::SeqCst),
                rag: self.rag.load(Ordering::SeqCst),
                web: self.web.load(Ordering::SeqCst),
            }
        }
    }

    struct FakePapers(Arc<CallCounter>);

    #[async_trait]
    impl PaperSearch for FakePapers {
        async fn search_papers(&self, query: &str) -> Result<PaperSearchOutcome> {
            self.0.papers.fetch_add(1, Ordering::SeqCst);
            Ok(PaperSearchOutcome::from_papers(vec![Paper {
                title: query.to_string(),
                summary: String::new(),
                authors: vec!["A. Author".into()],
                published: String::new(),
                link: String::new(),
                pdf_url: None,
            }]))
        }
    }

    struct FakeWeb(Arc<CallCounter>);

    #[async_trait]
    impl WebSearch for FakeWeb {
        async fn search_web(&self, query: &str) -> Result<WebContext> {
            self.0.web.fetch_add(1, Ordering::SeqCst);
            if query.contains("fail") {
                return Err(AppError::WebSearch {
                    message: "fail".into(),
                });
            }
            Ok(WebContext {
                context: format!("context for {}", query),
            })
        }
    }

    struct FakeRag(Arc<CallCounter>);

    #[async_trait]
    impl RagSearch for FakeRag {
        async fn answer(&self, query: &str) -> Result<Value> {
            self.0.rag.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "answer": query }))
        }
    }

    pub(crate) fn fake_backends() -> (Backends, Arc<CallCounter>) {
        let calls = Arc::new(CallCounter::default());
        let backends = Backends::new(
            Arc::new(FakePapers(calls.clone())),
            Arc::new(FakeWeb(calls.clone())),
            Arc::new(FakeRag(calls.clone())),
        );
        (backends, calls)
    }

    #[test]
    fn test_from_config_requires_secrets() {
        let err = Backends::from_config(&AppConfig::default()).err().unwrap();
        assert!(err.to_string().contains("PINECONE_API_KEY"));
    }

    #[test]
    fn test_from_config_builds_clients() {
        let mut config = AppConfig::default();
        config.vector_store.api_key = Some("pc".into());
        config.vector_store.index_host = Some("md-text.svc.pinecone.io".into());
        config.web_search.api_key = Some("tvly".into());
        config.generation.api_key = Some("nv".into());
        config.embedding.api_key = Some("sk".into());

        assert!(Backends::from_config(&config).is_ok());
    }
}
