pub mod card;
pub mod config;
pub mod conflict;
pub mod embedding;

pub use card::{
    find_duplicate_id, now_millis, sequential_id, Card, CardMeta, Representation, SCENE_TYPE,
    UNKNOWN_TYPE,
};
pub use config::{Config, EmbeddingConfig, LoggingConfig, ServerConfig, SyncConfig};
pub use conflict::Conflict;
pub use embedding::{cosine_similarity, MemoryEntry, MemoryRecord, SearchHit};
