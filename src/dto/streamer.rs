//! DTOs backing the streamer configuration surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dao::models::GameEntity, dto::format_system_time};

/// Game row as listed on the streamer's configuration page.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameListItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// RFC 3339 creation timestamp; lists are ordered newest first.
    pub created_at: String,
    /// Whether this game is the one currently activated by the streamer.
    pub is_active: bool,
}

impl GameListItem {
    /// Project a game entity, flagging it when it matches the active game.
    pub fn from_entity(game: &GameEntity, active_game_id: Option<Uuid>) -> Self {
        Self {
            id: game.id,
            title: game.title.clone(),
            description: game.description.clone(),
            created_at: format_system_time(game.created_at),
            is_active: active_game_id == Some(game.id),
        }
    }
}

/// Request to activate a game for the streamer's channel.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActivateGameRequest {
    pub game_id: Uuid,
}

/// Generic action acknowledgement used by streamer endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}
