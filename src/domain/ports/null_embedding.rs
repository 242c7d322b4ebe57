//! Null embedding provider implementation.
//!
//! Used when no embedding backend is configured. Records are still stored,
//! they just carry empty vectors and every search score is zero.

use async_trait::async_trait;

use super::embedding::EmbeddingProvider;
use crate::domain::errors::DomainResult;

/// A no-op embedding provider that returns empty vectors.
#[derive(Debug, Clone, Default)]
pub struct NullEmbeddingProvider;

impl NullEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn embed(&self, _text: &str) -> DomainResult<Vec<f32>> {
        Ok(Vec::new())
    }

    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        Ok(vec![Vec::new(); texts.len()])
    }
}
