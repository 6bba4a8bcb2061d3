use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Role a panel user holds on the host platform's channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular channel viewer playing the active game.
    Viewer,
    /// Channel owner; the host platform calls this role "broadcaster".
    Streamer,
}

/// How a completed attempt qualifies for the leaderboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Every completed attempt ranks.
    FreeToPlay,
    /// Only attempts with a confirmed donation rank.
    DonationRequired,
}

/// Input widget a question is answered with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    /// Free-form text input.
    Text,
    /// Pick one value from a fixed option list.
    MultiSelect,
    /// Numeric slider between `min_value` and `max_value`.
    Slider,
}

/// Panel user row, created on first sighting of a host identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Primary key of the user row.
    pub id: Uuid,
    /// Identity on the host platform; unique per user.
    pub host_id: String,
    /// Contact email captured on the user form, if any.
    pub email: Option<String>,
    /// Display name; synthesized as `User_<first 8 of host id>` until the
    /// platform provides a real one.
    pub display_name: String,
    /// Role on the channel.
    pub role: Role,
    /// For streamers, the game currently activated for their channel.
    pub active_game_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

impl UserEntity {
    /// Placeholder display name derived from a host identity.
    pub fn placeholder_name(host_id: &str) -> String {
        let prefix: String = host_id.chars().take(8).collect();
        format!("User_{prefix}")
    }
}

/// Branding references attached to a game.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrandingEntity {
    /// Primary accent color (CSS value).
    pub primary_color: Option<String>,
    /// Secondary accent color (CSS value).
    pub secondary_color: Option<String>,
    /// URL to the sponsor or game logo.
    pub logo_url: Option<String>,
}

/// Game definition provisioned out of band and activated by streamers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Title shown on the info step.
    pub title: String,
    /// Longer description shown on the info step.
    pub description: String,
    /// Optional external donation link.
    pub donation_link: Option<String>,
    /// Optional prize text.
    pub prize: Option<String>,
    /// Color/logo references used by the panel frontend.
    pub branding: BrandingEntity,
    /// Terms the viewer must accept on the user form.
    pub terms_text: String,
    /// Whether every streamer may activate this game.
    pub is_public: bool,
    /// Explicit allow-list of host ids when the game is not public.
    pub allowed_host_ids: Vec<String>,
    /// Maximum attempts per viewer; `None` means unlimited.
    pub entry_limit: Option<u32>,
    /// Leaderboard qualification rule.
    pub scoring_mode: ScoringMode,
    /// Optional validity window start.
    pub starts_at: Option<SystemTime>,
    /// Optional validity window end.
    pub ends_at: Option<SystemTime>,
    /// Whether the game has been closed out of band.
    pub is_closed: bool,
    /// Creation timestamp; games list newest first.
    pub created_at: SystemTime,
}

impl GameEntity {
    /// Visibility rule: a game is eligible for a host id iff it is public or
    /// the id is on the allow-list.
    pub fn is_eligible_for(&self, host_id: &str) -> bool {
        self.is_public || self.allowed_host_ids.iter().any(|id| id == host_id)
    }
}

/// Single question inside a game, ordered by creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Question text.
    pub question_text: String,
    /// Widget used to answer.
    pub input_kind: InputKind,
    /// Stored correct answer; questions without one never score.
    pub correct_answer: Option<String>,
    /// Option list for multi-select questions.
    pub options: Option<Vec<String>>,
    /// Lower bound for slider questions.
    pub min_value: Option<f64>,
    /// Upper bound for slider questions.
    pub max_value: Option<f64>,
    /// Whether the numeric answer is recorded as the tiebreaker guess.
    pub is_tiebreaker: bool,
    /// Creation timestamp; defines question order.
    pub created_at: SystemTime,
}

/// One submitted answer to one question within one attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryEntity {
    /// Primary key of the entry row.
    pub id: Uuid,
    /// Game the attempt belongs to.
    pub game_id: Uuid,
    /// User row id of the answering viewer.
    pub user_id: Uuid,
    /// Host identity of the answering viewer.
    pub host_id: String,
    /// Question being answered.
    pub question_id: Uuid,
    /// Raw submitted answer string.
    pub submitted_answer: String,
    /// Payment flag copied from the attempt.
    pub is_paid: bool,
    /// External checkout session, set once a donation callback arrives.
    pub checkout_session_id: Option<String>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// One completed attempt: total points plus consent metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntity {
    /// Primary key of the score row.
    pub id: Uuid,
    /// Game the attempt belongs to.
    pub game_id: Uuid,
    /// User row id of the viewer.
    pub user_id: Uuid,
    /// Host identity of the viewer.
    pub host_id: String,
    /// Count of exactly-matching answers.
    pub total_score: u32,
    /// Parsed tiebreaker guess, if the game has a tiebreaker question.
    pub tiebreaker_guess: Option<f64>,
    /// Whether the attempt has a confirmed donation.
    pub is_paid: bool,
    /// Always false at submission time; winners are decided out of band.
    pub is_winner: bool,
    /// Sequential attempt number per viewer per game, starting at 1.
    pub attempt_number: u32,
    /// Email captured on the user form.
    pub email: Option<String>,
    /// When the viewer consented to email contact.
    pub email_consent_at: Option<SystemTime>,
    /// When the viewer accepted the game terms.
    pub terms_accepted_at: Option<SystemTime>,
    /// Creation timestamp; breaks leaderboard ties, earliest first.
    pub created_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_name_truncates_long_host_ids() {
        assert_eq!(UserEntity::placeholder_name("123456789"), "User_12345678");
        assert_eq!(UserEntity::placeholder_name("abc"), "User_abc");
    }

    #[test]
    fn eligibility_follows_public_or_allow_list() {
        let mut game = GameEntity {
            id: Uuid::new_v4(),
            title: "quiz".into(),
            description: String::new(),
            donation_link: None,
            prize: None,
            branding: BrandingEntity::default(),
            terms_text: String::new(),
            is_public: false,
            allowed_host_ids: vec!["X".into()],
            entry_limit: None,
            scoring_mode: ScoringMode::FreeToPlay,
            starts_at: None,
            ends_at: None,
            is_closed: false,
            created_at: SystemTime::now(),
        };

        assert!(game.is_eligible_for("X"));
        assert!(!game.is_eligible_for("Y"));

        game.is_public = true;
        assert!(game.is_eligible_for("Y"));
    }
}
