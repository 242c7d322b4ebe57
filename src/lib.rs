//! storysync - three-representation story card sync engine
//!
//! Keeps one ordered list of cards consistent across a delimited outline
//! file, a JSON index and a flattened narrative file. An edit to any of the
//! three is merged and written out to the other two; REST writes go through
//! an optimistic-concurrency check first.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Card models, errors and ports
//! - **Service Layer** (`services`): Transcoding, merging, conflict checks and propagation
//! - **Adapter Layer** (`adapters`): HTTP surface and embedding store
//! - **Infrastructure Layer** (`infrastructure`): Config, logging, files and watcher
//! - **CLI Layer** (`cli`): Command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{Card, CardMeta, Config, Conflict, Representation};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::storage::StoryFiles;
pub use services::{CardService, ConflictDetector, SyncController, SyncSettings};
