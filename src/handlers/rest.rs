use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use log::debug;
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::enums::SideRequest;
use crate::game::{CreateGameResult, Game};
use crate::modes::MODE_WITH_FRIEND;
use crate::GameId;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModeParams {
    /// 0 random, 1 X, 2 O
    #[serde(default)]
    pub my_side: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateWithFriendRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub mode_params: ModeParams,
}

// POST /api/v1/games/modes/with-friend
pub async fn create_with_friend(
    State(state): State<AppState>,
    Json(req): Json<CreateWithFriendRequest>,
) -> Result<(StatusCode, Json<CreateGameResult>), ApiError> {
    debug!("create with-friend game for client {:?}", req.client_id);

    let side_request = SideRequest::try_from(req.mode_params.my_side)
        .map_err(|err| err.with_detail(format!("my_side {}", req.mode_params.my_side)))?;
    let created = state
        .use_case
        .create_game(req.client_id, MODE_WITH_FRIEND, side_request)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/games/{game_id}/state
pub async fn get_state(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> Result<Json<Game>, ApiError> {
    let game = state.use_case.get_game(game_id).await?;
    Ok(Json(game))
}
