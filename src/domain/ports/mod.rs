//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - EmbeddingStore: the similarity-search store notified after every pass
//! - EmbeddingProvider: text to vector conversion used by the local store

pub mod embedding;
pub mod embedding_store;
pub mod null_embedding;

pub use embedding::EmbeddingProvider;
pub use embedding_store::EmbeddingStore;
pub use null_embedding::NullEmbeddingProvider;
