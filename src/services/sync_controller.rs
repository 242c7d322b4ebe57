//! Change propagation between the three store files.
//!
//! The controller owns a single debounce timer shared by all three files
//! and a re-entrancy lock. A burst of file events collapses into one pass;
//! the last event's file decides the merge direction:
//!
//! | changed file | merge                                        | rewritten        |
//! |--------------|----------------------------------------------|------------------|
//! | outline      | `merge_from_secondary(outline, index)`       | index, narrative |
//! | narrative    | `merge_from_secondary(paragraphs, index)`    | index, outline   |
//! | index        | `merge_from_json(index, outline)`            | outline, story   |
//!
//! A pass that expires while the lock is held is dropped, not queued. The
//! lock is released a short, fixed delay after a pass finishes so the
//! filesystem events caused by the pass's own writes are dropped too.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{now_millis, Card, MemoryEntry, Representation, SyncConfig};
use crate::domain::ports::EmbeddingStore;
use crate::infrastructure::storage::StoryFiles;
use crate::services::reconciler::{merge_from_json, merge_from_secondary};
use crate::services::transcoder::{parse_outline, split_narrative};

/// Where the controller is in its debounce/propagate cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Waiting for file events.
    Idle,
    /// Events received, debounce timer running.
    PendingDebounce,
    /// A propagation pass is executing.
    Propagating,
}

/// Timing parameters for the controller.
#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    pub debounce: Duration,
    pub lock_release_delay: Duration,
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            debounce: config.debounce(),
            lock_release_delay: config.lock_release(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

/// Boolean re-entrancy lock. Not a queue: a failed acquire means "skip".
#[derive(Debug, Clone, Default)]
pub struct PropagationLock {
    held: Arc<AtomicBool>,
}

impl PropagationLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    /// Take the lock if it is free. The returned guard releases it
    /// `release_delay` after being dropped.
    pub fn try_acquire(&self, release_delay: Duration) -> Option<PropagationGuard> {
        self.held
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PropagationGuard {
                held: Arc::clone(&self.held),
                release_delay,
            })
    }
}

/// Holds the [`PropagationLock`]; releases it on drop, on every exit path.
#[derive(Debug)]
pub struct PropagationGuard {
    held: Arc<AtomicBool>,
    release_delay: Duration,
}

impl Drop for PropagationGuard {
    fn drop(&mut self) {
        let held = Arc::clone(&self.held);
        if self.release_delay.is_zero() {
            held.store(false, Ordering::SeqCst);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let delay = self.release_delay;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    held.store(false, Ordering::SeqCst);
                });
            }
            // No runtime to schedule on; release now rather than never.
            Err(_) => held.store(false, Ordering::SeqCst),
        }
    }
}

/// Result of one debounce expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// A pass ran and wrote `cards` cards.
    Propagated {
        origin: Representation,
        cards: usize,
    },
    /// The lock was held; the trigger was discarded.
    Dropped,
    /// The path is not one of the store files.
    Ignored,
    /// The pass failed; the error was logged.
    Failed(String),
}

/// Which branch the startup reconciliation took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// All stores were empty; the example card was written everywhere.
    Seeded,
    /// Only the narrative had content; its paragraphs became the cards.
    FromNarrative { cards: usize },
    /// The outline was merged into the index and written everywhere.
    Merged { cards: usize },
}

/// Coordinates file-triggered propagation passes.
pub struct SyncController {
    files: StoryFiles,
    embeddings: Arc<dyn EmbeddingStore>,
    settings: SyncSettings,
    lock: PropagationLock,
    state: Mutex<ControllerState>,
}

impl SyncController {
    pub fn new(
        files: StoryFiles,
        embeddings: Arc<dyn EmbeddingStore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            files,
            embeddings,
            settings,
            lock: PropagationLock::new(),
            state: Mutex::new(ControllerState::Idle),
        }
    }

    pub fn files(&self) -> &StoryFiles {
        &self.files
    }

    pub fn lock(&self) -> &PropagationLock {
        &self.lock
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    pub fn state(&self) -> ControllerState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_state(&self, state: ControllerState) {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }

    /// Consume file events until the sender side closes.
    ///
    /// Every event restarts the shared debounce timer; when it expires the
    /// most recent event's path is handed to [`Self::on_debounce_expired`].
    pub async fn run(&self, mut events: UnboundedReceiver<PathBuf>) {
        while let Some(mut latest) = events.recv().await {
            self.set_state(ControllerState::PendingDebounce);
            let mut closed = false;

            loop {
                tokio::select! {
                    next = events.recv() => match next {
                        Some(path) => latest = path,
                        None => {
                            closed = true;
                            break;
                        }
                    },
                    () = tokio::time::sleep(self.settings.debounce) => break,
                }
            }

            let outcome = self.on_debounce_expired(&latest).await;
            debug!(path = %latest.display(), ?outcome, "debounce expired");

            if closed {
                break;
            }
        }
        self.set_state(ControllerState::Idle);
    }

    /// Run a pass for a change to `path`, unless one is already running.
    pub async fn on_debounce_expired(&self, path: &Path) -> PassOutcome {
        let Some(origin) = self.files.classify(path) else {
            self.set_state(ControllerState::Idle);
            return PassOutcome::Ignored;
        };

        let Some(_guard) = self.lock.try_acquire(self.settings.lock_release_delay) else {
            debug!(origin = %origin, "propagation lock held, dropping change");
            self.set_state(ControllerState::Idle);
            return PassOutcome::Dropped;
        };

        self.set_state(ControllerState::Propagating);
        let outcome = match self.propagate(origin).await {
            Ok(cards) => PassOutcome::Propagated {
                origin,
                cards: cards.len(),
            },
            Err(e) => {
                error!(origin = %origin, error = %e, "propagation pass failed");
                PassOutcome::Failed(e.to_string())
            }
        };
        self.set_state(ControllerState::Idle);
        outcome
    }

    /// Merge the changed representation against the others and rewrite
    /// every store except the one that changed.
    ///
    /// Callers must hold the propagation lock.
    async fn propagate(&self, origin: Representation) -> DomainResult<Vec<Card>> {
        let json_index = self.files.read_index().await;

        let merged = match origin {
            Representation::Outline => {
                let outline = parse_outline(&self.files.read_outline().await);
                merge_from_secondary(&outline, &json_index)
            }
            Representation::Narrative => {
                let paragraphs = split_narrative(&self.files.read_narrative().await);
                merge_from_secondary(&paragraphs, &json_index)
            }
            Representation::Json => {
                let outline = parse_outline(&self.files.read_outline().await);
                merge_from_json(&json_index, &outline)
            }
        };

        self.files.write_all_except(&merged, Some(origin)).await?;
        self.notify_embeddings(&merged, origin.change_source()).await;

        info!(origin = %origin, cards = merged.len(), "propagated change");
        Ok(merged)
    }

    /// One-time reconciliation of whatever the stores hold at startup.
    pub async fn bootstrap(&self) -> DomainResult<BootstrapOutcome> {
        let _guard = self.lock.try_acquire(self.settings.lock_release_delay);

        let outline = parse_outline(&self.files.read_outline().await);
        let json_index = self.files.read_index().await;
        let narrative = self.files.read_narrative().await;

        if outline.is_empty() && json_index.is_empty() {
            if narrative.trim().is_empty() {
                let seed = vec![Card::example(now_millis())];
                self.files.write_all_except(&seed, None).await?;
                self.notify_embeddings(&seed, "init").await;
                info!("initialized sample data");
                return Ok(BootstrapOutcome::Seeded);
            }

            let cards = split_narrative(&narrative);
            self.files.write_all_except(&cards, None).await?;
            self.notify_embeddings(&cards, "story_txt").await;
            info!(cards = cards.len(), "converted narrative into structured cards");
            return Ok(BootstrapOutcome::FromNarrative { cards: cards.len() });
        }

        let merged = merge_from_secondary(&outline, &json_index);
        self.files.write_all_except(&merged, None).await?;
        self.notify_embeddings(&merged, "init").await;
        info!(cards = merged.len(), "initial sync complete");
        Ok(BootstrapOutcome::Merged {
            cards: merged.len(),
        })
    }

    /// Write an accepted card list to all three stores and notify the
    /// embedding store.
    ///
    /// Takes the propagation lock when it is free so the watcher ignores
    /// the resulting events; it never waits for it.
    pub async fn publish(&self, cards: &[Card], source: &str) -> DomainResult<()> {
        let _guard = self.lock.try_acquire(self.settings.lock_release_delay);
        self.files.write_all_except(cards, None).await?;
        self.notify_embeddings(cards, source).await;
        Ok(())
    }

    /// Replace the narrative with `text` and fold its paragraphs under the
    /// JSON index, rewriting the index and the outline.
    pub async fn replace_story(&self, text: &str) -> DomainResult<Vec<Card>> {
        let _guard = self.lock.try_acquire(self.settings.lock_release_delay);

        self.files.write_narrative_text(text).await?;
        let json_index = self.files.read_index().await;
        let merged = merge_from_json(&json_index, &split_narrative(text));

        self.files.write_index(&merged).await?;
        self.files.write_outline(&merged).await?;
        self.notify_embeddings(&merged, Representation::Narrative.change_source())
            .await;

        info!(cards = merged.len(), "story text replaced");
        Ok(merged)
    }

    /// Best-effort: failures are logged and never undo the file writes.
    async fn notify_embeddings(&self, cards: &[Card], source: &str) {
        if cards.is_empty() {
            return;
        }
        let entries = cards
            .iter()
            .map(|card| MemoryEntry::new(card.content.clone(), source, card.tags.clone()))
            .collect();

        if let Err(e) = self.embeddings.add_texts(entries).await {
            warn!(source, error = %e, "embedding store notification failed");
        }
    }
}
