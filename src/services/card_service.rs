//! Card and story use cases behind the REST surface.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{find_duplicate_id, now_millis, Card};
use crate::services::conflict_detector::ConflictDetector;
use crate::services::sync_controller::SyncController;

/// Source label for embedding notifications caused by API writes.
pub const UI_SAVE_SOURCE: &str = "ui_save";

#[derive(Clone)]
pub struct CardService {
    controller: Arc<SyncController>,
    detector: ConflictDetector,
}

impl CardService {
    pub fn new(controller: Arc<SyncController>, detector: ConflictDetector) -> Self {
        Self {
            controller,
            detector,
        }
    }

    pub fn controller(&self) -> &Arc<SyncController> {
        &self.controller
    }

    /// The current JSON index.
    pub async fn list_cards(&self) -> Vec<Card> {
        self.controller.files().read_index().await
    }

    /// Replace the whole card list.
    ///
    /// Rejected batches leave every store untouched. Accepted batches are
    /// version-bumped, stamped with one timestamp and written to all three
    /// stores.
    #[instrument(skip(self, incoming), fields(cards = incoming.len()))]
    pub async fn save_cards(&self, incoming: Vec<Card>) -> DomainResult<Vec<Card>> {
        if let Some(id) = find_duplicate_id(&incoming) {
            return Err(DomainError::InvalidPayload(format!("duplicate card id '{id}'")));
        }

        let current = self.list_cards().await;
        let accepted = self.detector.apply(incoming, &current, now_millis())?;

        self.controller.publish(&accepted, UI_SAVE_SOURCE).await?;
        info!(cards = accepted.len(), "cards saved");
        Ok(accepted)
    }

    /// The current narrative text.
    pub async fn story_text(&self) -> String {
        self.controller.files().read_narrative().await
    }

    /// Replace the narrative and propagate it to the other stores.
    pub async fn replace_story(&self, text: &str) -> DomainResult<Vec<Card>> {
        self.controller.replace_story(text).await
    }
}
