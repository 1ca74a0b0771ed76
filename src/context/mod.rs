//! Context providers: supporting passages for a query.

pub mod elastic;
pub mod local;

pub use elastic::ElasticsearchProvider;
pub use local::LocalCorpus;

use crate::config::Config;
use crate::error::CollaboratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Rendered when retrieval produced nothing (or failed).
pub const EMPTY_CONTEXT: &str = "No specific context found.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub title: String,
    pub content: String,
    pub source: String,
    pub score: f64,
}

#[async_trait]
pub trait ContextProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Passages ordered by descending relevance, at most `max_results`.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Passage>, CollaboratorError>;
}

/// Flatten passages into the text handed to the generator.
pub fn render_context(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return EMPTY_CONTEXT.to_string();
    }
    passages
        .iter()
        .map(|p| format!("Source: {}\n{}", p.source, p.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Elasticsearch when an endpoint is configured, the built-in corpus
/// otherwise.
pub fn create_context_provider(config: &Config) -> Arc<dyn ContextProvider> {
    match config.retrieval.endpoint.as_deref().map(str::trim) {
        Some(endpoint) if !endpoint.is_empty() => {
            tracing::info!(endpoint, index = %config.retrieval.index, "using elasticsearch context provider");
            Arc::new(ElasticsearchProvider::new(
                endpoint,
                &config.retrieval,
                config.runtime.context_timeout_ms,
            ))
        }
        _ => {
            tracing::info!("no retrieval endpoint configured, using local corpus");
            Arc::new(LocalCorpus::builtin())
        }
    }
}
