//! Cards HTTP Server.
//!
//! REST surface over the card index, the narrative and the embedding store.
//! Bodies are parsed by hand from raw bytes so every malformed payload gets
//! the same `{ok:false, error}` 400 shape.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::domain::errors::DomainError;
use crate::domain::models::{Card, MemoryEntry, MemoryRecord, SearchHit, ServerConfig};
use crate::domain::ports::EmbeddingStore;
use crate::services::CardService;

/// Shared state for the cards HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub cards: CardService,
    pub memory: Arc<dyn EmbeddingStore>,
}

impl AppState {
    pub fn new(cards: CardService, memory: Arc<dyn EmbeddingStore>) -> Self {
        Self { cards, memory }
    }
}

/// A [`DomainError`] rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            DomainError::Conflict(conflicts) => (
                StatusCode::CONFLICT,
                Json(json!({ "ok": false, "conflicts": conflicts })),
            )
                .into_response(),
            err @ (DomainError::CardLimitExceeded { .. } | DomainError::InvalidPayload(_)) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": err.to_string() })),
            )
                .into_response(),
            err => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "ok": false, "error": err.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn invalid(message: impl Into<String>) -> ApiError {
    ApiError(DomainError::InvalidPayload(message.into()))
}

fn parse_json(body: &[u8]) -> ApiResult<Value> {
    serde_json::from_slice(body).map_err(|e| invalid(format!("malformed JSON body: {e}")))
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

const OK: OkResponse = OkResponse { ok: true };

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct BatchAddedResponse {
    pub ok: bool,
    pub added: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddBatchRequest {
    #[serde(default)]
    pub items: Vec<MemoryEntry>,
}

/// Query parameters for embedding search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_top")]
    pub top: usize,
}

fn default_top() -> usize {
    5
}

/// Editor save signal. Purely informational.
#[derive(Debug, Default, Deserialize)]
pub struct NotifyRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub ts: Option<i64>,
}

/// Build the router with every route and layer.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let app = Router::new()
        .route("/api/cards", get(list_cards).post(save_cards))
        .route("/api/story", get(get_story).post(replace_story))
        .route("/api/mem/add", post(mem_add))
        .route("/api/mem/addBatch", post(mem_add_batch))
        .route("/api/mem/search", get(mem_search))
        .route("/__vscode_notify", post(editor_notify))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes));

    if config.enable_cors {
        app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .layer(TraceLayer::new_for_http())
    } else {
        app.layer(TraceLayer::new_for_http())
    }
}

/// Cards HTTP Server.
pub struct CardsHttpServer {
    config: ServerConfig,
    state: AppState,
}

impl CardsHttpServer {
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        Self { config, state }
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = build_router(self.state, &self.config);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "cards HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

// Handler functions

async fn health_check() -> &'static str {
    "OK"
}

async fn list_cards(State(state): State<AppState>) -> Json<Vec<Card>> {
    Json(state.cards.list_cards().await)
}

async fn save_cards(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<OkResponse>> {
    let value = parse_json(&body)?;
    if !value.is_array() {
        return Err(invalid("expected an array of cards"));
    }
    let incoming: Vec<Card> =
        serde_json::from_value(value).map_err(|e| invalid(format!("invalid card: {e}")))?;

    state.cards.save_cards(incoming).await?;
    Ok(Json(OK))
}

async fn get_story(State(state): State<AppState>) -> Json<StoryResponse> {
    Json(StoryResponse {
        text: state.cards.story_text().await,
    })
}

async fn replace_story(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<OkResponse>> {
    let value = parse_json(&body)?;
    let Some(text) = value.get("text").and_then(Value::as_str) else {
        return Err(invalid("'text' must be a string"));
    };

    state.cards.replace_story(text).await?;
    Ok(Json(OK))
}

async fn mem_add(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<MemoryRecord>> {
    let entry: MemoryEntry = serde_json::from_value(parse_json(&body)?)
        .map_err(|e| invalid(format!("invalid memory entry: {e}")))?;
    if entry.text.is_empty() {
        return Err(invalid("'text' must not be empty"));
    }

    Ok(Json(state.memory.add_text(entry).await?))
}

async fn mem_add_batch(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<BatchAddedResponse>> {
    let request: AddBatchRequest = serde_json::from_value(parse_json(&body)?)
        .map_err(|e| invalid(format!("invalid batch: {e}")))?;
    let added = request.items.len();

    state.memory.add_texts(request.items).await?;
    Ok(Json(BatchAddedResponse { ok: true, added }))
}

async fn mem_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    Ok(Json(state.memory.search(&params.q, params.top).await?))
}

async fn editor_notify(body: Bytes) -> Json<OkResponse> {
    let notice: NotifyRequest = serde_json::from_slice(&body).unwrap_or_default();
    tracing::info!(path = ?notice.path, ts = ?notice.ts, "editor notification");
    Json(OK)
}
