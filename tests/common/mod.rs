//! Common test utilities for integration tests
//!
//! Provides temporary data directories, a recording embedding store and
//! controller fixtures shared across the integration test files.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use storysync::domain::errors::{DomainError, DomainResult};
use storysync::domain::models::{MemoryEntry, MemoryRecord, Representation, SearchHit};
use storysync::domain::ports::EmbeddingStore;
use storysync::infrastructure::storage::StoryFiles;
use storysync::services::{CardService, ConflictDetector, SyncController, SyncSettings};

/// Embedding store that remembers every entry it was given.
#[derive(Default)]
pub struct RecordingEmbeddingStore {
    batches: Mutex<Vec<Vec<MemoryEntry>>>,
}

impl RecordingEmbeddingStore {
    pub fn batches(&self) -> Vec<Vec<MemoryEntry>> {
        self.batches.lock().unwrap().clone()
    }

    /// Source label of each batch, in call order.
    pub fn sources(&self) -> Vec<String> {
        self.batches()
            .iter()
            .filter_map(|batch| batch.first().map(|e| e.source.clone()))
            .collect()
    }
}

#[async_trait]
impl EmbeddingStore for RecordingEmbeddingStore {
    async fn add_text(&self, entry: MemoryEntry) -> DomainResult<MemoryRecord> {
        self.batches.lock().unwrap().push(vec![entry.clone()]);
        Ok(MemoryRecord::from_entry(entry, Vec::new()))
    }

    async fn add_texts(&self, entries: Vec<MemoryEntry>) -> DomainResult<()> {
        self.batches.lock().unwrap().push(entries);
        Ok(())
    }

    async fn search(&self, _query: &str, _top_k: usize) -> DomainResult<Vec<SearchHit>> {
        Ok(Vec::new())
    }
}

/// Embedding store whose every call fails.
pub struct FailingEmbeddingStore;

#[async_trait]
impl EmbeddingStore for FailingEmbeddingStore {
    async fn add_text(&self, _entry: MemoryEntry) -> DomainResult<MemoryRecord> {
        Err(DomainError::Embedding("store offline".to_string()))
    }

    async fn add_texts(&self, _entries: Vec<MemoryEntry>) -> DomainResult<()> {
        Err(DomainError::Embedding("store offline".to_string()))
    }

    async fn search(&self, _query: &str, _top_k: usize) -> DomainResult<Vec<SearchHit>> {
        Err(DomainError::Embedding("store offline".to_string()))
    }
}

/// A controller over a fresh temporary data directory.
pub struct Fixture {
    pub dir: TempDir,
    pub controller: Arc<SyncController>,
    pub embeddings: Arc<RecordingEmbeddingStore>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_settings(fast_settings()).await
    }

    pub async fn with_settings(settings: SyncSettings) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let files = StoryFiles::new(dir.path().join("data"));
        files.ensure_files().await.expect("Failed to create store files");

        let embeddings = Arc::new(RecordingEmbeddingStore::default());
        let controller = Arc::new(SyncController::new(
            files,
            Arc::clone(&embeddings) as Arc<dyn EmbeddingStore>,
            settings,
        ));

        Self {
            dir,
            controller,
            embeddings,
        }
    }

    pub fn files(&self) -> &StoryFiles {
        self.controller.files()
    }

    pub fn card_service(&self, card_limit: usize) -> CardService {
        CardService::new(
            Arc::clone(&self.controller),
            ConflictDetector::new(5, card_limit),
        )
    }

    pub fn read(&self, representation: Representation) -> String {
        std::fs::read_to_string(self.files().path(representation)).unwrap()
    }

    pub fn write(&self, representation: Representation, contents: &str) {
        std::fs::write(self.files().path(representation), contents).unwrap();
    }

    /// Contents of the three store files, outline/index/narrative.
    pub fn snapshot(&self) -> [String; 3] {
        [
            self.read(Representation::Outline),
            self.read(Representation::Json),
            self.read(Representation::Narrative),
        ]
    }
}

/// Short debounce and an immediate lock release.
pub fn fast_settings() -> SyncSettings {
    SyncSettings {
        debounce: Duration::from_millis(30),
        lock_release_delay: Duration::ZERO,
    }
}

/// Poll `condition` every 20ms until it holds or `timeout` elapses.
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
