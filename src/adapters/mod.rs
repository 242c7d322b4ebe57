//! Adapters implementing the domain ports and exposing the services.

pub mod embeddings;
pub mod http;
