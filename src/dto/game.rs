//! Game projections shared by the viewer and streamer surfaces.

use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{BrandingEntity, GameEntity, ScoringMode};

/// Branding references the panel frontend applies to the active game.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct BrandingDto {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
}

impl From<&BrandingEntity> for BrandingDto {
    fn from(branding: &BrandingEntity) -> Self {
        Self {
            primary_color: branding.primary_color.clone(),
            secondary_color: branding.secondary_color.clone(),
            logo_url: branding.logo_url.clone(),
        }
    }
}

/// Everything a viewer panel needs to render a game, minus the answers.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub prize: Option<String>,
    pub donation_link: Option<String>,
    pub branding: BrandingDto,
    pub terms_text: String,
    pub scoring_mode: ScoringMode,
    /// Maximum attempts per viewer; omitted when unlimited.
    pub entry_limit: Option<u32>,
}

impl From<&GameEntity> for GameSummary {
    fn from(game: &GameEntity) -> Self {
        Self {
            id: game.id,
            title: game.title.clone(),
            description: game.description.clone(),
            prize: game.prize.clone(),
            donation_link: game.donation_link.clone(),
            branding: BrandingDto::from(&game.branding),
            terms_text: game.terms_text.clone(),
            scoring_mode: game.scoring_mode,
            entry_limit: game.entry_limit,
        }
    }
}
