use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    context::HostContext,
    dto::leaderboard::LeaderboardResponse,
    error::AppError,
    services::leaderboard_service,
    state::SharedState,
};

/// Leaderboard read and streaming endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/{game_id}/leaderboard", get(get_leaderboard))
        .route("/games/{game_id}/leaderboard/stream", get(stream_leaderboard))
}

#[utoipa::path(
    get,
    path = "/games/{game_id}/leaderboard",
    tag = "leaderboard",
    params(("game_id" = Uuid, Path, description = "Game to rank")),
    responses(
        (status = 200, description = "Ranked leaderboard", body = LeaderboardResponse),
        (status = 404, description = "Game not found"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Fetch the current leaderboard of a game.
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Path(game_id): Path<Uuid>,
    context: HostContext,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let payload =
        leaderboard_service::fetch(&state, game_id, context.host_id.as_deref()).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/games/{game_id}/leaderboard/stream",
    tag = "leaderboard",
    params(("game_id" = Uuid, Path, description = "Game to rank")),
    responses((status = 200, description = "SSE stream of leaderboard projections"))
)]
/// Stream leaderboard projections, re-emitting on every score change.
pub async fn stream_leaderboard(
    State(state): State<SharedState>,
    Path(game_id): Path<Uuid>,
    context: HostContext,
) -> impl IntoResponse {
    leaderboard_service::stream(state, game_id, context.host_id)
}
