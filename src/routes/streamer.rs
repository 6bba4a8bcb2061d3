use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    context::HostContext,
    dto::streamer::{ActionResponse, ActivateGameRequest, GameListItem},
    error::AppError,
    services::streamer_service,
    state::SharedState,
};

/// Streamer configuration endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/streamer/games", get(list_games))
        .route("/streamer/games/activate", post(activate_game))
}

#[utoipa::path(
    get,
    path = "/streamer/games",
    tag = "streamer",
    responses(
        (status = 200, description = "Eligible games, newest first", body = [GameListItem]),
        (status = 401, description = "Caller is not the channel owner"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// List the games this streamer may activate, newest first.
pub async fn list_games(
    State(state): State<SharedState>,
    context: HostContext,
) -> Result<Json<Vec<GameListItem>>, AppError> {
    let host_id = context.require_host_id()?;
    let payload = streamer_service::list_games(&state, host_id, context.role).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    post,
    path = "/streamer/games/activate",
    tag = "streamer",
    request_body = ActivateGameRequest,
    responses(
        (status = 200, description = "Game activated", body = ActionResponse),
        (status = 401, description = "Caller is not the channel owner or the game is not eligible"),
        (status = 404, description = "Game not found")
    )
)]
/// Activate a game for the streamer's channel.
pub async fn activate_game(
    State(state): State<SharedState>,
    context: HostContext,
    Json(request): Json<ActivateGameRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let host_id = context.require_host_id()?;
    let payload =
        streamer_service::activate_game(&state, host_id, context.role, request.game_id).await?;
    Ok(Json(payload))
}
