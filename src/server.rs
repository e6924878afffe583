//! HTTP request layer.
//!
//! Handlers decode a typed body, make one call into the [`SessionStore`] and
//! serialize the resulting [`GameSnapshot`]. Engine failures become 400s,
//! unresolvable games 404s.

use crate::corpus::Corpus;
use crate::frontend::{self, IndexPage};
use crate::session::{GameSnapshot, SessionStore, StoreError, StoreStats};
use axum::Router;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use codenames_engine::{WordPool, WordPoolError, WordSet};
use derive_getters::Getters;
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

/// State shared by every handler.
#[derive(Debug, Clone, Getters, derive_new::new)]
pub struct AppState {
    /// The game registry.
    store: SessionStore,
    /// Word lists.
    corpus: Arc<Corpus>,
    /// Index page template.
    index: Arc<IndexPage>,
}

/// Request for the current state of a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStateRequest {
    /// Game to resolve.
    pub game_id: String,
    /// Token from the client's last response, if any.
    #[serde(default)]
    pub state_id: Option<String>,
}

/// Request to reveal a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessRequest {
    /// Game to act on.
    pub game_id: String,
    /// Token from the client's last response, if any.
    #[serde(default)]
    pub state_id: Option<String>,
    /// Cell to reveal (0-24).
    pub index: usize,
}

/// Request to pass the turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndTurnRequest {
    /// Game to act on.
    pub game_id: String,
    /// Token from the client's last response, if any.
    #[serde(default)]
    pub state_id: Option<String>,
}

/// Request to deal a new board under an existing id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextGameRequest {
    /// Game to replace.
    pub game_id: String,
    /// Custom words; empty means the default corpus.
    #[serde(default)]
    pub word_set: Vec<String>,
}

/// Query string of the deprecated `GET /game/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveGameQuery {
    /// Token from the client's last response, if any.
    #[serde(default)]
    pub state_id: Option<String>,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Display, Error, From)]
pub enum ApiError {
    /// Body or query did not decode.
    #[display("Error decoding request: {_0}")]
    #[from]
    Body(JsonRejection),

    /// Query string did not decode.
    #[display("Error decoding query string: {_0}")]
    #[from]
    Query(QueryRejection),

    /// Empty `game_id`.
    #[display("game_id is required")]
    MissingGameId,

    /// Unusable custom word set.
    #[display("{_0}")]
    #[from]
    WordSet(WordPoolError),

    /// Store refused or could not resolve the game.
    #[display("{_0}")]
    #[from]
    Store(StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Body(_)
            | ApiError::Query(_)
            | ApiError::MissingGameId
            | ApiError::WordSet(_)
            | ApiError::Store(StoreError::Rejected(_)) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!(%status, error = %self, "Request failed");
        (status, self.to_string()).into_response()
    }
}

/// Builds the application router.
pub fn router(state: AppState, static_dir: impl AsRef<FsPath>) -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/next-game", post(next_game))
        .route("/end-turn", post(end_turn))
        .route("/guess", post(guess))
        .route("/game/{id}", get(retrieve_game))
        .route("/game-state", post(game_state))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .route("/", get(frontend::index))
        .route("/{id}", get(frontend::index_for_game))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn require_game_id(game_id: &str) -> Result<(), ApiError> {
    if game_id.trim().is_empty() {
        return Err(ApiError::MissingGameId);
    }
    Ok(())
}

/// POST /game-state
#[instrument(skip_all)]
async fn game_state(
    State(state): State<AppState>,
    body: Result<Json<GameStateRequest>, JsonRejection>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let Json(req) = body?;
    require_game_id(&req.game_id)?;
    debug!(game_id = %req.game_id, "Resolving game state");
    Ok(Json(
        state
            .store
            .resolve_or_new(&req.game_id, req.state_id.as_deref()),
    ))
}

/// GET /game/{id}
///
/// Deprecated: use `POST /game-state`.
#[instrument(skip(state, query))]
async fn retrieve_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<RetrieveGameQuery>, QueryRejection>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let Query(query) = query?;
    require_game_id(&id)?;
    Ok(Json(state.store.resolve_or_new(&id, query.state_id.as_deref())))
}

/// POST /guess
#[instrument(skip_all)]
async fn guess(
    State(state): State<AppState>,
    body: Result<Json<GuessRequest>, JsonRejection>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let Json(req) = body?;
    require_game_id(&req.game_id)?;
    debug!(game_id = %req.game_id, index = req.index, "Processing guess");
    let snapshot = state
        .store
        .mutate(&req.game_id, req.state_id.as_deref(), |game| game.guess(req.index))?;
    Ok(Json(snapshot))
}

/// POST /end-turn
#[instrument(skip_all)]
async fn end_turn(
    State(state): State<AppState>,
    body: Result<Json<EndTurnRequest>, JsonRejection>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let Json(req) = body?;
    require_game_id(&req.game_id)?;
    debug!(game_id = %req.game_id, "Ending turn");
    let snapshot = state
        .store
        .mutate(&req.game_id, req.state_id.as_deref(), |game| game.end_turn())?;
    Ok(Json(snapshot))
}

/// POST /next-game
#[instrument(skip_all)]
async fn next_game(
    State(state): State<AppState>,
    body: Result<Json<NextGameRequest>, JsonRejection>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let Json(req) = body?;
    require_game_id(&req.game_id)?;

    let distinct: BTreeSet<String> = req
        .word_set
        .iter()
        .map(|w| w.trim().to_uppercase())
        .filter(|w| !w.is_empty())
        .collect();

    let word_set = if distinct.is_empty() {
        WordSet::Default(state.store.default_words().clone())
    } else {
        let pool = WordPool::new(distinct).map_err(|e| {
            warn!(game_id = %req.game_id, error = %e, "Rejected custom word set");
            e
        })?;
        WordSet::Custom(pool)
    };

    info!(game_id = %req.game_id, custom = word_set.is_custom(), "Starting next game");
    Ok(Json(state.store.create_new(&req.game_id, word_set)))
}

/// GET /stats
#[instrument(skip_all)]
async fn stats(State(state): State<AppState>) -> Json<StoreStats> {
    Json(state.store.stats())
}
