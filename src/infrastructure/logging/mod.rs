//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - pretty or JSON console output
//! - optional daily-rolling JSON file output

pub mod logger;

pub use logger::{init, LoggerGuard};
