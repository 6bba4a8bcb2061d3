//! Wire representation of the five panel tables.
//!
//! Timestamps travel as RFC 3339 strings; everything else maps one-to-one
//! onto the entity types.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use super::error::{RestDaoError, RestResult};
use crate::dao::models::{
    BrandingEntity, EntryEntity, GameEntity, InputKind, QuestionEntity, Role, ScoreEntity,
    ScoringMode, UserEntity,
};

/// Users table name.
pub const USERS_TABLE: &str = "panel_users";
/// Games table name.
pub const GAMES_TABLE: &str = "panel_games";
/// Questions table name.
pub const QUESTIONS_TABLE: &str = "panel_questions";
/// Entries table name.
pub const ENTRIES_TABLE: &str = "panel_entries";
/// Scores table name.
pub const SCORES_TABLE: &str = "panel_scores";

fn format_timestamp(value: SystemTime) -> String {
    OffsetDateTime::from(value)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn parse_timestamp(table: &'static str, value: &str) -> RestResult<SystemTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map(SystemTime::from)
        .map_err(|source| RestDaoError::InvalidTimestamp {
            table,
            value: value.to_string(),
            source,
        })
}

fn parse_opt_timestamp(
    table: &'static str,
    value: Option<&str>,
) -> RestResult<Option<SystemTime>> {
    value.map(|raw| parse_timestamp(table, raw)).transpose()
}

/// Row shape of the users table.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    pub host_id: String,
    pub email: Option<String>,
    pub display_name: String,
    pub role: Role,
    pub active_game_id: Option<Uuid>,
    pub created_at: String,
}

impl UserRow {
    pub fn from_entity(user: UserEntity) -> Self {
        Self {
            id: user.id,
            host_id: user.host_id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            active_game_id: user.active_game_id,
            created_at: format_timestamp(user.created_at),
        }
    }

    pub fn into_entity(self) -> RestResult<UserEntity> {
        Ok(UserEntity {
            id: self.id,
            host_id: self.host_id,
            email: self.email,
            display_name: self.display_name,
            role: self.role,
            active_game_id: self.active_game_id,
            created_at: parse_timestamp(USERS_TABLE, &self.created_at)?,
        })
    }
}

/// Row shape of the games table; branding is a JSON column.
#[derive(Debug, Serialize, Deserialize)]
pub struct GameRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub donation_link: Option<String>,
    pub prize: Option<String>,
    #[serde(default)]
    pub branding: BrandingEntity,
    pub terms_text: String,
    pub is_public: bool,
    #[serde(default)]
    pub allowed_host_ids: Vec<String>,
    pub entry_limit: Option<u32>,
    pub scoring_mode: ScoringMode,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub is_closed: bool,
    pub created_at: String,
}

impl GameRow {
    pub fn into_entity(self) -> RestResult<GameEntity> {
        Ok(GameEntity {
            id: self.id,
            title: self.title,
            description: self.description,
            donation_link: self.donation_link,
            prize: self.prize,
            branding: self.branding,
            terms_text: self.terms_text,
            is_public: self.is_public,
            allowed_host_ids: self.allowed_host_ids,
            entry_limit: self.entry_limit,
            scoring_mode: self.scoring_mode,
            starts_at: parse_opt_timestamp(GAMES_TABLE, self.starts_at.as_deref())?,
            ends_at: parse_opt_timestamp(GAMES_TABLE, self.ends_at.as_deref())?,
            is_closed: self.is_closed,
            created_at: parse_timestamp(GAMES_TABLE, &self.created_at)?,
        })
    }
}

/// Row shape of the questions table.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionRow {
    pub id: Uuid,
    pub game_id: Uuid,
    pub question_text: String,
    pub input_kind: InputKind,
    pub correct_answer: Option<String>,
    pub options: Option<Vec<String>>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub is_tiebreaker: bool,
    pub created_at: String,
}

impl QuestionRow {
    pub fn into_entity(self) -> RestResult<QuestionEntity> {
        Ok(QuestionEntity {
            id: self.id,
            game_id: self.game_id,
            question_text: self.question_text,
            input_kind: self.input_kind,
            correct_answer: self.correct_answer,
            options: self.options,
            min_value: self.min_value,
            max_value: self.max_value,
            is_tiebreaker: self.is_tiebreaker,
            created_at: parse_timestamp(QUESTIONS_TABLE, &self.created_at)?,
        })
    }
}

/// Row shape of the entries table.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryRow {
    pub id: Uuid,
    pub game_id: Uuid,
    pub user_id: Uuid,
    pub host_id: String,
    pub question_id: Uuid,
    pub submitted_answer: String,
    pub is_paid: bool,
    pub checkout_session_id: Option<String>,
    pub created_at: String,
}

impl EntryRow {
    pub fn from_entity(entry: EntryEntity) -> Self {
        Self {
            id: entry.id,
            game_id: entry.game_id,
            user_id: entry.user_id,
            host_id: entry.host_id,
            question_id: entry.question_id,
            submitted_answer: entry.submitted_answer,
            is_paid: entry.is_paid,
            checkout_session_id: entry.checkout_session_id,
            created_at: format_timestamp(entry.created_at),
        }
    }
}

/// Row shape of the scores table.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreRow {
    pub id: Uuid,
    pub game_id: Uuid,
    pub user_id: Uuid,
    pub host_id: String,
    pub total_score: u32,
    pub tiebreaker_guess: Option<f64>,
    pub is_paid: bool,
    pub is_winner: bool,
    pub attempt_number: u32,
    pub email: Option<String>,
    pub email_consent_at: Option<String>,
    pub terms_accepted_at: Option<String>,
    pub created_at: String,
}

impl ScoreRow {
    pub fn from_entity(score: ScoreEntity) -> Self {
        Self {
            id: score.id,
            game_id: score.game_id,
            user_id: score.user_id,
            host_id: score.host_id,
            total_score: score.total_score,
            tiebreaker_guess: score.tiebreaker_guess,
            is_paid: score.is_paid,
            is_winner: score.is_winner,
            attempt_number: score.attempt_number,
            email: score.email,
            email_consent_at: score.email_consent_at.map(format_timestamp),
            terms_accepted_at: score.terms_accepted_at.map(format_timestamp),
            created_at: format_timestamp(score.created_at),
        }
    }

    pub fn into_entity(self) -> RestResult<ScoreEntity> {
        Ok(ScoreEntity {
            id: self.id,
            game_id: self.game_id,
            user_id: self.user_id,
            host_id: self.host_id,
            total_score: self.total_score,
            tiebreaker_guess: self.tiebreaker_guess,
            is_paid: self.is_paid,
            is_winner: self.is_winner,
            attempt_number: self.attempt_number,
            email: self.email,
            email_consent_at: parse_opt_timestamp(SCORES_TABLE, self.email_consent_at.as_deref())?,
            terms_accepted_at: parse_opt_timestamp(
                SCORES_TABLE,
                self.terms_accepted_at.as_deref(),
            )?,
            created_at: parse_timestamp(SCORES_TABLE, &self.created_at)?,
        })
    }
}
