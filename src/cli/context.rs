//! Wiring shared by the commands.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::embeddings::{provider_from_config, JsonFileEmbeddingStore};
use crate::domain::models::Config;
use crate::domain::ports::EmbeddingStore;
use crate::infrastructure::storage::StoryFiles;
use crate::services::{CardService, ConflictDetector, SyncController, SyncSettings};

/// The services built from one loaded [`Config`].
pub struct AppContext {
    pub config: Config,
    pub controller: Arc<SyncController>,
    pub memory: Arc<dyn EmbeddingStore>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let files = StoryFiles::new(&config.data_dir);
        let provider = provider_from_config(&config.embedding)
            .context("Failed to create embedding provider")?;
        tracing::debug!(provider = provider.name(), "embedding provider ready");

        let memory: Arc<dyn EmbeddingStore> =
            Arc::new(JsonFileEmbeddingStore::new(files.memory_path(), provider));
        let controller = Arc::new(SyncController::new(
            files,
            Arc::clone(&memory),
            SyncSettings::from(&config.sync),
        ));

        Ok(Self {
            config,
            controller,
            memory,
        })
    }

    pub fn files(&self) -> &StoryFiles {
        self.controller.files()
    }

    pub fn card_service(&self) -> CardService {
        CardService::new(
            Arc::clone(&self.controller),
            ConflictDetector::from_config(&self.config.sync),
        )
    }
}
