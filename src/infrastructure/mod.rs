//! Infrastructure layer module
//!
//! Integrations with the outside world:
//! - config: figment-based hierarchical configuration
//! - logging: tracing subscriber setup
//! - storage: the store files in the data directory
//! - watcher: filesystem notifications for the store files

pub mod config;
pub mod logging;
pub mod storage;
pub mod watcher;

pub use config::{ConfigError, ConfigLoader};
pub use storage::StoryFiles;
pub use watcher::StoryWatcher;
