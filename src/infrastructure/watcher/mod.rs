//! Filesystem watcher for the store files.
//!
//! Watches the data directory (not the files themselves, so editors that
//! save by rename keep being seen) and forwards the path of every
//! non-access event on one of the three store files to the sync
//! controller. Debouncing is the controller's job; this layer only filters.

use std::path::PathBuf;

use anyhow::{Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::infrastructure::storage::StoryFiles;

/// Keeps the underlying OS watcher alive; dropping it stops watching.
pub struct StoryWatcher {
    _watcher: RecommendedWatcher,
}

impl StoryWatcher {
    /// Start watching `files.data_dir()`, sending changed store paths to `tx`.
    pub fn start(files: &StoryFiles, tx: UnboundedSender<PathBuf>) -> Result<Self> {
        let filter = files.clone();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "file watcher error");
                    return;
                }
            };
            if event.kind.is_access() {
                return;
            }
            for path in event.paths {
                if filter.classify(&path).is_none() {
                    continue;
                }
                debug!(path = %path.display(), kind = ?event.kind, "store file event");
                if tx.send(path).is_err() {
                    // Controller has shut down.
                    return;
                }
            }
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(files.data_dir(), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", files.data_dir().display()))?;

        info!(dir = %files.data_dir().display(), "watching story files");
        Ok(Self { _watcher: watcher })
    }
}
