//! Flat-file storage for the card representations.

pub mod story_files;

pub use story_files::{StoryFiles, INDEX_FILE, MEMORY_FILE, NARRATIVE_FILE, OUTLINE_FILE};
