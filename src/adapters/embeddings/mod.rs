//! Embedding adapters: the local JSON-file store and the providers that
//! vectorise text for it.

pub mod json_file_store;
pub mod openai;

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::{EmbeddingProvider, NullEmbeddingProvider};

pub use json_file_store::JsonFileEmbeddingStore;
pub use openai::OpenAiEmbeddingProvider;

/// Build the provider named by `config.provider`.
pub fn provider_from_config(config: &EmbeddingConfig) -> DomainResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "null" => Ok(Arc::new(NullEmbeddingProvider::new())),
        "openai" => Ok(Arc::new(OpenAiEmbeddingProvider::new(config)?)),
        other => Err(DomainError::Embedding(format!(
            "unknown embedding provider '{other}'"
        ))),
    }
}
