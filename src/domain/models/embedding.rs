//! Embedding store models
//!
//! Records kept by the local embedding store that mirrors card content for
//! similarity search. Field names match the persisted `mem0.json` layout.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::now_millis;

fn default_source() -> String {
    "auto".to_string()
}

/// Text submitted to the embedding store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub text: String,

    /// Where the text came from (e.g. "init", "ui_save")
    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl MemoryEntry {
    pub fn new(text: impl Into<String>, source: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            tags,
        }
    }
}

/// A stored, embedded text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub text: String,
    pub source: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Milliseconds since the Unix epoch
    pub created: i64,
}

impl MemoryRecord {
    /// Create a record for `entry` with a fresh id
    pub fn from_entry(entry: MemoryEntry, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: entry.text,
            source: entry.source,
            tags: entry.tags,
            embedding,
            created: now_millis(),
        }
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub score: f32,
    pub tags: Vec<String>,
}

/// Cosine similarity over the common prefix of two vectors.
///
/// Zero-length or zero-norm inputs score 0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt() + 1e-12)
}
