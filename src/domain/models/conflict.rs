//! Optimistic-concurrency conflict record.

use serde::{Deserialize, Serialize};

use super::card::Card;

/// A card whose server copy is newer than the copy a client submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: String,
    /// Copy currently held in the JSON index.
    pub server: Card,
    /// Copy the client tried to write.
    pub incoming: Card,
}

impl Conflict {
    pub fn new(server: Card, incoming: Card) -> Self {
        Self {
            id: incoming.id.clone(),
            server,
            incoming,
        }
    }
}
