//! Viewer flow progression: opening sessions, advancing through questions,
//! scoring, and persisting completed attempts.

use std::{sync::Arc, time::SystemTime};

use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    dao::models::{EntryEntity, GameEntity, QuestionEntity, ScoreEntity, UserEntity},
    dto::viewer::{AnswerRequest, FlowSnapshot, UserFormRequest},
    error::ServiceError,
    services::panel_service,
    state::{ChangeEvent, FlowEvent, FlowKey, FlowStep, PriorAttempt, SharedState, ViewerFlow},
};

/// Everything needed to serve one flow request: the active game, its
/// questions in order, and the viewer's session handle.
struct FlowContext {
    game: GameEntity,
    questions: Vec<QuestionEntity>,
    flow: Arc<Mutex<ViewerFlow>>,
}

/// Resolve (and lazily open) the viewer's flow on the channel's active game.
async fn resolve_flow(
    state: &SharedState,
    host_id: &str,
    channel_id: &str,
) -> Result<FlowContext, ServiceError> {
    let store = state.require_panel_store().await?;

    let game = panel_service::active_game_for_channel(state, channel_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("no active game on this channel".into()))?;
    let questions = store.list_questions(game.id).await?;

    let key = FlowKey {
        game_id: game.id,
        host_id: host_id.to_string(),
    };
    let flow = match state.existing_flow(&key) {
        Some(handle) => handle,
        None => {
            let prior = store
                .find_latest_score(game.id, host_id.to_string())
                .await?
                .map(|score| PriorAttempt {
                    total_score: score.total_score,
                    attempt_number: score.attempt_number,
                    is_paid: score.is_paid,
                });
            let question_ids = questions.iter().map(|question| question.id).collect();
            let flow = ViewerFlow::new(game.id, question_ids, game.entry_limit, prior);
            state.store_flow(key, flow)
        }
    };

    Ok(FlowContext {
        game,
        questions,
        flow,
    })
}

fn snapshot(flow: &ViewerFlow, questions: &[QuestionEntity]) -> FlowSnapshot {
    let current = flow
        .current_question_id()
        .and_then(|id| questions.iter().find(|question| question.id == id));
    FlowSnapshot::from_flow(flow, current)
}

/// Current state of the viewer's flow, opening a session when none is live.
pub async fn open_flow(
    state: &SharedState,
    host_id: &str,
    channel_id: &str,
) -> Result<FlowSnapshot, ServiceError> {
    let context = resolve_flow(state, host_id, channel_id).await?;
    let flow = context.flow.lock().await;
    Ok(snapshot(&flow, &context.questions))
}

/// Begin an attempt from the info step.
pub async fn start(
    state: &SharedState,
    host_id: &str,
    channel_id: &str,
) -> Result<FlowSnapshot, ServiceError> {
    let context = resolve_flow(state, host_id, channel_id).await?;
    let mut flow = context.flow.lock().await;
    flow.apply(FlowEvent::Start)?;
    Ok(snapshot(&flow, &context.questions))
}

/// Record the answer to the question at the cursor.
pub async fn answer(
    state: &SharedState,
    host_id: &str,
    channel_id: &str,
    request: AnswerRequest,
) -> Result<FlowSnapshot, ServiceError> {
    let context = resolve_flow(state, host_id, channel_id).await?;
    let mut flow = context.flow.lock().await;
    flow.apply(FlowEvent::Answer {
        question_id: request.question_id,
        answer: request.answer,
    })?;
    Ok(snapshot(&flow, &context.questions))
}

/// Complete the attempt: score the accumulated answers, persist the entry
/// and score rows, and record the captured email.
///
/// Entries and the score are two separate writes with no transaction
/// between them; a failure in between leaves entries without a matching
/// score row, which is logged but not reconciled.
pub async fn submit(
    state: &SharedState,
    host_id: &str,
    channel_id: &str,
    request: UserFormRequest,
) -> Result<FlowSnapshot, ServiceError> {
    let store = state.require_panel_store().await?;
    let context = resolve_flow(state, host_id, channel_id).await?;
    let mut flow = context.flow.lock().await;

    if !matches!(flow.step(), FlowStep::UserForm) {
        return Err(ServiceError::InvalidState(
            "the attempt is not awaiting the user form".into(),
        ));
    }

    let user = store
        .find_user_by_host_id(host_id.to_string())
        .await?
        .ok_or_else(|| ServiceError::NotFound("unknown panel user".into()))?;

    let (total_score, tiebreaker_guess) = score_answers(&context.questions, flow.answers());
    let now = SystemTime::now();

    let entries = build_entries(&context.game, &user, &flow, now);
    store.insert_entries(entries).await?;

    let score = ScoreEntity {
        id: Uuid::new_v4(),
        game_id: context.game.id,
        user_id: user.id,
        host_id: user.host_id.clone(),
        total_score,
        tiebreaker_guess,
        is_paid: flow.is_paid(),
        is_winner: false,
        attempt_number: flow.attempt_number(),
        email: Some(request.email.clone()),
        email_consent_at: request.email_consent.then_some(now),
        terms_accepted_at: Some(now),
        created_at: now,
    };
    if let Err(err) = store.insert_score(score).await {
        // The entries of this attempt are already persisted and will have
        // no matching score row.
        error!(
            host_id,
            game_id = %context.game.id,
            attempt = flow.attempt_number(),
            error = %err,
            "score write failed after entries were persisted"
        );
        return Err(err.into());
    }

    store.update_user_email(user.id, request.email).await?;

    flow.apply(FlowEvent::CompleteAttempt { total_score })?;
    state.changes().publish(ChangeEvent::scores(context.game.id));
    info!(
        host_id,
        game_id = %context.game.id,
        attempt = flow.attempt_number(),
        total_score,
        "attempt completed"
    );

    Ok(snapshot(&flow, &context.questions))
}

/// Start the game over, consuming one more attempt.
pub async fn retry(
    state: &SharedState,
    host_id: &str,
    channel_id: &str,
) -> Result<FlowSnapshot, ServiceError> {
    let context = resolve_flow(state, host_id, channel_id).await?;
    let mut flow = context.flow.lock().await;
    flow.apply(FlowEvent::TryAgain)?;
    Ok(snapshot(&flow, &context.questions))
}

fn build_entries(
    game: &GameEntity,
    user: &UserEntity,
    flow: &ViewerFlow,
    now: SystemTime,
) -> Vec<EntryEntity> {
    flow.answers()
        .iter()
        .map(|(question_id, submitted_answer)| EntryEntity {
            id: Uuid::new_v4(),
            game_id: game.id,
            user_id: user.id,
            host_id: user.host_id.clone(),
            question_id: *question_id,
            submitted_answer: submitted_answer.clone(),
            is_paid: flow.is_paid(),
            checkout_session_id: None,
            created_at: now,
        })
        .collect()
}

/// Score an attempt: one point per answer that exactly string-equals the
/// question's stored correct answer (case sensitive). The tiebreaker guess
/// is the numeric parse of the answer to the tiebreaker question, when it
/// parses.
pub fn score_answers(
    questions: &[QuestionEntity],
    answers: &IndexMap<Uuid, String>,
) -> (u32, Option<f64>) {
    let mut total = 0;
    let mut tiebreaker = None;

    for question in questions {
        let Some(answer) = answers.get(&question.id) else {
            continue;
        };
        if question.is_tiebreaker && tiebreaker.is_none() {
            tiebreaker = answer.parse::<f64>().ok();
        }
        if question.correct_answer.as_deref() == Some(answer.as_str()) {
            total += 1;
        }
    }

    (total, tiebreaker)
}

#[cfg(test)]
mod tests {
    use crate::dao::models::InputKind;

    use super::*;

    fn question(correct: Option<&str>, tiebreaker: bool) -> QuestionEntity {
        QuestionEntity {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            question_text: "q".into(),
            input_kind: InputKind::Text,
            correct_answer: correct.map(Into::into),
            options: None,
            min_value: None,
            max_value: None,
            is_tiebreaker: tiebreaker,
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn scoring_counts_exact_matches_only() {
        let questions = vec![
            question(Some("Paris"), false),
            question(Some("42"), false),
            question(Some("blue"), false),
            question(Some("7"), false),
            question(Some("yes"), false),
        ];

        let mut answers = IndexMap::new();
        answers.insert(questions[0].id, "Paris".to_string());
        answers.insert(questions[1].id, "42".to_string());
        answers.insert(questions[2].id, "Blue".to_string()); // case mismatch
        answers.insert(questions[3].id, "8".to_string());
        answers.insert(questions[4].id, "yes".to_string());

        let (total, tiebreaker) = score_answers(&questions, &answers);
        assert_eq!(total, 3);
        assert_eq!(tiebreaker, None);
    }

    #[test]
    fn scoring_is_independent_of_answer_order() {
        let questions = vec![question(Some("a"), false), question(Some("b"), false)];

        let mut reversed = IndexMap::new();
        reversed.insert(questions[1].id, "b".to_string());
        reversed.insert(questions[0].id, "a".to_string());

        let (total, _) = score_answers(&questions, &reversed);
        assert_eq!(total, 2);
    }

    #[test]
    fn tiebreaker_guess_is_parsed_from_the_flagged_question() {
        let questions = vec![
            question(Some("x"), false),
            question(Some("100"), true),
        ];

        let mut answers = IndexMap::new();
        answers.insert(questions[1].id, "87.5".to_string());

        let (total, tiebreaker) = score_answers(&questions, &answers);
        assert_eq!(total, 0);
        assert_eq!(tiebreaker, Some(87.5));
    }

    #[test]
    fn unparseable_tiebreaker_answers_record_no_guess() {
        let questions = vec![question(None, true)];
        let mut answers = IndexMap::new();
        answers.insert(questions[0].id, "lots".to_string());

        let (_, tiebreaker) = score_answers(&questions, &answers);
        assert_eq!(tiebreaker, None);
    }

    #[test]
    fn questions_without_a_correct_answer_never_score() {
        let questions = vec![question(None, false)];
        let mut answers = IndexMap::new();
        answers.insert(questions[0].id, "anything".to_string());

        let (total, _) = score_answers(&questions, &answers);
        assert_eq!(total, 0);
    }
}
