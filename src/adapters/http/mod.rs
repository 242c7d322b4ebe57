//! HTTP adapter for the card sync engine.

pub mod cards_http;

pub use cards_http::{build_router, ApiError, AppState, CardsHttpServer};
