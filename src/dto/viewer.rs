//! DTOs for the viewer flow surface: session bootstrap, question
//! progression, and the final submission form.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationErrors};

use crate::{
    dao::models::{InputKind, QuestionEntity, Role},
    dto::{game::GameSummary, validation::validate_terms_accepted},
    state::{FlowStep, ViewerFlow},
};

/// Response returned by the session bootstrap endpoint.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Display name of the resolved panel user.
    pub display_name: String,
    /// Role the host platform reports for this viewer.
    pub role: Role,
    /// Game currently activated on this channel, if any.
    pub game: Option<GameSummary>,
}

/// Question projection sent to viewer panels.
///
/// The stored correct answer never leaves the backend.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionDto {
    pub id: Uuid,
    pub question_text: String,
    pub input_kind: InputKind,
    pub options: Option<Vec<String>>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub is_tiebreaker: bool,
}

impl From<&QuestionEntity> for QuestionDto {
    fn from(question: &QuestionEntity) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text.clone(),
            input_kind: question.input_kind,
            options: question.options.clone(),
            min_value: question.min_value,
            max_value: question.max_value,
            is_tiebreaker: question.is_tiebreaker,
        }
    }
}

/// Flow step as exposed to panels.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowStepDto {
    /// Game presentation and the start action.
    Info,
    /// Answering the ordered question list.
    Questions,
    /// Email and terms form.
    UserForm,
    /// Final score and leaderboard.
    Score,
}

impl From<&FlowStep> for FlowStepDto {
    fn from(step: &FlowStep) -> Self {
        match step {
            FlowStep::Info => FlowStepDto::Info,
            FlowStep::Questions { .. } => FlowStepDto::Questions,
            FlowStep::UserForm => FlowStepDto::UserForm,
            FlowStep::Score => FlowStepDto::Score,
        }
    }
}

/// Snapshot of one viewer's flow, returned after every flow mutation.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct FlowSnapshot {
    pub step: FlowStepDto,
    /// Question at the cursor while on the questions step.
    pub question: Option<QuestionDto>,
    /// Zero-based cursor position while on the questions step.
    pub question_index: Option<usize>,
    pub total_questions: usize,
    /// Number the next submitted attempt will carry.
    pub attempt_number: u32,
    /// Score of the latest completed attempt, if any.
    pub total_score: Option<u32>,
    pub can_retry: bool,
    pub has_completed: bool,
    pub is_paid: bool,
}

impl FlowSnapshot {
    /// Project a flow and the question at its cursor into a panel snapshot.
    pub fn from_flow(flow: &ViewerFlow, question: Option<&QuestionEntity>) -> Self {
        let question_index = match flow.step() {
            FlowStep::Questions { index } => Some(*index),
            _ => None,
        };

        Self {
            step: FlowStepDto::from(flow.step()),
            question: question.map(QuestionDto::from),
            question_index,
            total_questions: flow.question_count(),
            attempt_number: flow.attempt_number(),
            total_score: flow.total_score(),
            can_retry: flow.retry_allowed(),
            has_completed: flow.has_completed(),
            is_paid: flow.is_paid(),
        }
    }
}

/// Answer to the question currently at the cursor.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    /// Question the answer targets; must match the cursor.
    pub question_id: Uuid,
    #[validate(length(min = 1, message = "answer must not be empty"))]
    pub answer: String,
}

/// User form submitted after the last question; completes the attempt.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserFormRequest {
    pub email: String,
    pub terms_accepted: bool,
    /// Whether the viewer opted into email contact.
    #[serde(default)]
    pub email_consent: bool,
}

impl Validate for UserFormRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.email.is_empty() {
            let mut err = validator::ValidationError::new("email_empty");
            err.message = Some("email must not be empty".into());
            errors.add("email", err);
        } else if !self.email.validate_email() {
            let mut err = validator::ValidationError::new("email_format");
            err.message = Some("a valid email address is required".into());
            errors.add("email", err);
        }

        if let Err(err) = validate_terms_accepted(&self.terms_accepted) {
            errors.add("terms_accepted", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Donation confirmation forwarded by the checkout provider.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CheckoutCallbackRequest {
    pub game_id: Uuid,
    #[validate(length(min = 1, message = "checkout session id must not be empty"))]
    pub checkout_session_id: String,
}
