//! Domain layer for storysync
//!
//! Card models, configuration types, errors and the ports implemented by
//! adapters.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
