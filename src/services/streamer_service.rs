//! Streamer configuration surface: eligible game enumeration and activation.

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::Role,
    dto::streamer::{ActionResponse, GameListItem},
    error::ServiceError,
    state::{ChangeEvent, SharedState},
};

fn require_streamer(role: Role) -> Result<(), ServiceError> {
    if role != Role::Streamer {
        return Err(ServiceError::Unauthorized(
            "only the channel owner can manage games".into(),
        ));
    }
    Ok(())
}

/// Games the streamer may activate (public or allow-listed), newest first.
pub async fn list_games(
    state: &SharedState,
    host_id: &str,
    role: Role,
) -> Result<Vec<GameListItem>, ServiceError> {
    require_streamer(role)?;
    let store = state.require_panel_store().await?;

    let active_game_id = store
        .find_user_by_host_id(host_id.to_string())
        .await?
        .and_then(|user| user.active_game_id);
    let games = store.list_eligible_games(host_id.to_string()).await?;

    Ok(games
        .iter()
        .map(|game| GameListItem::from_entity(game, active_game_id))
        .collect())
}

/// Activate a game for the streamer's channel.
///
/// Activation is unconditional within the eligible set: the validity
/// window and closed flag are not checked here.
pub async fn activate_game(
    state: &SharedState,
    host_id: &str,
    role: Role,
    game_id: Uuid,
) -> Result<ActionResponse, ServiceError> {
    require_streamer(role)?;
    let store = state.require_panel_store().await?;

    let game = store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("game not found".into()))?;
    if !game.is_eligible_for(host_id) {
        return Err(ServiceError::Unauthorized(
            "game is not available to this channel".into(),
        ));
    }

    store.set_active_game(host_id.to_string(), game_id).await?;
    state.changes().publish(ChangeEvent::users());
    info!(host_id, %game_id, "active game changed");

    Ok(ActionResponse {
        message: format!("game `{}` activated", game.title),
    })
}
