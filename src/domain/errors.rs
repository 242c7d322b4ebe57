//! Domain errors for the story synchronisation engine.

use thiserror::Error;

use super::models::Conflict;

/// Format conflicting card ids as a comma separated list.
fn format_conflict_ids(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Domain-level errors that can occur while reconciling stores.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Card limit exceeded ({limit}): got {actual} cards")]
    CardLimitExceeded { limit: usize, actual: usize },

    #[error("Write rejected, stale cards: {}", format_conflict_ids(.0))]
    Conflict(Vec<Conflict>),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Embedding store error: {0}")]
    Embedding(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
