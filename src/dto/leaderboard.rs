//! Leaderboard projections streamed to panels.

use serde::Serialize;
use utoipa::ToSchema;

/// One ranked row of a game's leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct LeaderboardEntry {
    /// Host identity behind the row.
    pub host_id: String,
    /// Display name, or a placeholder derived from the host id.
    pub display_name: String,
    pub total_score: u32,
    /// One-based rank after sorting.
    pub rank: usize,
    /// Whether the row belongs to the requesting viewer.
    pub is_current_user: bool,
}

/// Full leaderboard of one game, already sorted and ranked.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}
