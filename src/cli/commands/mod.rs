//! CLI command implementations.

pub mod cards;
pub mod serve;
pub mod sync;
