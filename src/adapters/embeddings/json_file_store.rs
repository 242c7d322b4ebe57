//! Embedding store persisted as a JSON array in `mem0.json`.
//!
//! Every write loads the whole file, appends, and rewrites it. A process-wide
//! mutex serialises writers; the file is small and append-only.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{cosine_similarity, MemoryEntry, MemoryRecord, SearchHit};
use crate::domain::ports::{EmbeddingProvider, EmbeddingStore};

pub struct JsonFileEmbeddingStore {
    path: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    write_lock: Mutex<()>,
}

impl JsonFileEmbeddingStore {
    pub fn new(path: impl Into<PathBuf>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            path: path.into(),
            provider,
            write_lock: Mutex::new(()),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// All stored records; a missing or malformed file reads as empty.
    pub async fn load(&self) -> Vec<MemoryRecord> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable embedding store");
                return Vec::new();
            }
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "malformed embedding store, treating as empty");
            Vec::new()
        })
    }

    async fn save(&self, records: &[MemoryRecord]) -> DomainResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Append-only: records are never deduplicated or replaced, so repeated
    /// syncs of the same cards grow the file.
    async fn append(&self, new_records: Vec<MemoryRecord>) -> DomainResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await;
        records.extend(new_records);
        self.save(&records).await
    }
}

#[async_trait]
impl EmbeddingStore for JsonFileEmbeddingStore {
    async fn add_text(&self, entry: MemoryEntry) -> DomainResult<MemoryRecord> {
        let embedding = self.provider.embed(&entry.text).await?;
        let record = MemoryRecord::from_entry(entry, embedding);
        self.append(vec![record.clone()]).await?;
        Ok(record)
    }

    async fn add_texts(&self, entries: Vec<MemoryEntry>) -> DomainResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = entries.iter().map(|e| e.text.clone()).collect();
        let vectors = self.provider.embed_batch(&texts).await?;
        if vectors.len() != entries.len() {
            return Err(DomainError::Embedding(format!(
                "provider returned {} vectors for {} texts",
                vectors.len(),
                entries.len()
            )));
        }

        let records = entries
            .into_iter()
            .zip(vectors)
            .map(|(entry, embedding)| MemoryRecord::from_entry(entry, embedding))
            .collect::<Vec<_>>();
        debug!(count = records.len(), "storing embeddings");
        self.append(records).await
    }

    async fn search(&self, query: &str, top_k: usize) -> DomainResult<Vec<SearchHit>> {
        if query.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let records = self.load().await;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.provider.embed(query).await?;
        let mut scored: Vec<(f32, MemoryRecord)> = records
            .into_iter()
            .map(|record| (cosine_similarity(&query_vector, &record.embedding), record))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, record)| SearchHit {
                id: record.id,
                text: record.text,
                score,
                tags: record.tags,
            })
            .collect())
    }
}
