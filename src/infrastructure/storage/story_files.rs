//! The three persisted representations of the card list.
//!
//! Reads are best-effort: a missing, unreadable or malformed file reads as
//! empty so propagation always has a starting point. Writes replace the
//! whole file and are skipped when the content is already identical, so a
//! pass that changes nothing emits no filesystem events.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Card, Representation};
use crate::services::transcoder::{render_narrative, render_outline};

/// File name of the outline representation.
pub const OUTLINE_FILE: &str = "story_outline.txt";
/// File name of the JSON index.
pub const INDEX_FILE: &str = "index.json";
/// File name of the narrative representation.
pub const NARRATIVE_FILE: &str = "story.txt";
/// File name of the local embedding store.
pub const MEMORY_FILE: &str = "mem0.json";

/// Paths and I/O for the files in the data directory.
#[derive(Debug, Clone)]
pub struct StoryFiles {
    data_dir: PathBuf,
}

impl StoryFiles {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file holding `representation`.
    pub fn path(&self, representation: Representation) -> PathBuf {
        let name = match representation {
            Representation::Outline => OUTLINE_FILE,
            Representation::Json => INDEX_FILE,
            Representation::Narrative => NARRATIVE_FILE,
        };
        self.data_dir.join(name)
    }

    pub fn memory_path(&self) -> PathBuf {
        self.data_dir.join(MEMORY_FILE)
    }

    /// Paths of the three watched store files.
    pub fn watched_paths(&self) -> [PathBuf; 3] {
        [
            self.path(Representation::Outline),
            self.path(Representation::Json),
            self.path(Representation::Narrative),
        ]
    }

    /// Which representation `path` holds, matched by file name.
    pub fn classify(&self, path: &Path) -> Option<Representation> {
        match path.file_name()?.to_str()? {
            OUTLINE_FILE => Some(Representation::Outline),
            INDEX_FILE => Some(Representation::Json),
            NARRATIVE_FILE => Some(Representation::Narrative),
            _ => None,
        }
    }

    /// Create the data directory and any missing store file, empty.
    pub async fn ensure_files(&self) -> DomainResult<()> {
        fs::create_dir_all(&self.data_dir).await?;
        let mut paths = self.watched_paths().to_vec();
        paths.push(self.memory_path());

        for path in paths {
            if fs::try_exists(&path).await? {
                continue;
            }
            fs::write(&path, "").await?;
            tracing::debug!(path = %path.display(), "created empty store file");
        }
        Ok(())
    }

    async fn read_text(&self, representation: Representation) -> String {
        let path = self.path(representation);
        match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable store file, treating as empty");
                String::new()
            }
        }
    }

    pub async fn read_outline(&self) -> String {
        self.read_text(Representation::Outline).await
    }

    pub async fn read_narrative(&self) -> String {
        self.read_text(Representation::Narrative).await
    }

    /// Read the JSON index; malformed content reads as an empty list.
    pub async fn read_index(&self) -> Vec<Card> {
        let raw = self.read_text(Representation::Json).await;
        if raw.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str(&raw) {
            Ok(cards) => cards,
            Err(e) => {
                tracing::warn!(error = %e, "malformed JSON index, treating as empty");
                Vec::new()
            }
        }
    }

    /// Replace `path` with `contents` unless it already holds exactly that.
    ///
    /// Returns whether the file was written.
    async fn write_if_changed(&self, path: &Path, contents: &str) -> DomainResult<bool> {
        match fs::read_to_string(path).await {
            Ok(existing) if existing == contents => return Ok(false),
            _ => {}
        }
        fs::create_dir_all(&self.data_dir).await?;
        fs::write(path, contents).await?;
        Ok(true)
    }

    pub async fn write_index(&self, cards: &[Card]) -> DomainResult<bool> {
        let json = serde_json::to_string_pretty(cards)?;
        self.write_if_changed(&self.path(Representation::Json), &json)
            .await
    }

    pub async fn write_outline(&self, cards: &[Card]) -> DomainResult<bool> {
        self.write_if_changed(&self.path(Representation::Outline), &render_outline(cards))
            .await
    }

    pub async fn write_narrative(&self, cards: &[Card]) -> DomainResult<bool> {
        self.write_narrative_text(&render_narrative(cards)).await
    }

    pub async fn write_narrative_text(&self, text: &str) -> DomainResult<bool> {
        self.write_if_changed(&self.path(Representation::Narrative), text)
            .await
    }

    /// Write `cards` to every representation except `skip`.
    pub async fn write_all_except(
        &self,
        cards: &[Card],
        skip: Option<Representation>,
    ) -> DomainResult<()> {
        if skip != Some(Representation::Json) {
            self.write_index(cards).await?;
        }
        if skip != Some(Representation::Outline) {
            self.write_outline(cards).await?;
        }
        if skip != Some(Representation::Narrative) {
            self.write_narrative(cards).await?;
        }
        Ok(())
    }
}
