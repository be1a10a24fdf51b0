// HTTP surface: routing, shared state and error mapping.
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::application::GameUseCase;
use crate::errors::{DataxoError, GameError, GameErrorKind};
use crate::repository::InMemoryGameRepository;
use crate::websocket::WebSocketService;

pub mod rest;
pub mod ws;

/// The engine as wired up by the server.
pub type Engine = GameUseCase<InMemoryGameRepository>;

#[derive(Clone)]
pub struct AppState {
    pub use_case: Arc<Engine>,
    pub ws: WebSocketService<InMemoryGameRepository>,
}

impl AppState {
    pub fn new(use_case: Arc<Engine>, broadcast_capacity: usize) -> Self {
        let ws = WebSocketService::new(Arc::clone(&use_case), broadcast_capacity);
        Self { use_case, ws }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/v1/games/modes/with-friend", post(rest::create_with_friend))
        .route("/api/v1/games/{game_id}/state", get(rest::get_state))
        .route("/api/v1/games/{game_id}", get(ws::ws_handler))
        .with_state(state)
        .layer(cors)
}

/// Engine error rendered as `{"error": ...}` with a matching status code.
#[derive(Debug)]
pub struct ApiError(pub DataxoError);

impl From<DataxoError> for ApiError {
    fn from(err: DataxoError) -> Self {
        ApiError(err)
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        ApiError(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DataxoError::Game(err) => match err.kind {
                GameErrorKind::NotFound => StatusCode::NOT_FOUND,
                GameErrorKind::InvalidSide | GameErrorKind::InvalidConfig => StatusCode::BAD_REQUEST,
                _ => StatusCode::CONFLICT,
            },
            DataxoError::Network(_) => StatusCode::BAD_REQUEST,
            DataxoError::Logic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
