//! Embedding store port.
//!
//! The store that mirrors card contents for similarity search. The sync
//! engine only ever calls [`EmbeddingStore::add_texts`]; the other methods
//! back the `/api/mem` routes.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{MemoryEntry, MemoryRecord, SearchHit};

#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Embed and store a single text, returning the stored record.
    async fn add_text(&self, entry: MemoryEntry) -> DomainResult<MemoryRecord>;

    /// Embed and store several texts in one write.
    async fn add_texts(&self, entries: Vec<MemoryEntry>) -> DomainResult<()>;

    /// Rank stored records against `query`, best first, at most `top_k`.
    async fn search(&self, query: &str, top_k: usize) -> DomainResult<Vec<SearchHit>>;
}
