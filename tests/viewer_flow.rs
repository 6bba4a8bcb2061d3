//! End-to-end service tests over the in-memory store: session bootstrap,
//! the full viewer flow, entry limits, and leaderboard qualification.

use std::{sync::Arc, time::SystemTime};

use quiz_panel_back::{
    config::AppConfig,
    dao::{
        models::{
            BrandingEntity, GameEntity, InputKind, QuestionEntity, Role, ScoringMode,
        },
        panel_store::memory::MemoryPanelStore,
    },
    dto::viewer::{AnswerRequest, CheckoutCallbackRequest, FlowStepDto, UserFormRequest},
    error::ServiceError,
    services::{leaderboard_service, panel_service, streamer_service, viewer_service},
    state::{AppState, SharedState},
};
use uuid::Uuid;
use validator::Validate;

const CHANNEL: &str = "chan-777";

struct Harness {
    state: SharedState,
    store: MemoryPanelStore,
}

async fn harness() -> Harness {
    let state = AppState::new(AppConfig::default());
    let store = MemoryPanelStore::new();
    state.install_panel_store(Arc::new(store.clone())).await;
    Harness { state, store }
}

fn game(entry_limit: Option<u32>, scoring_mode: ScoringMode) -> GameEntity {
    GameEntity {
        id: Uuid::new_v4(),
        title: "Summer Trivia".into(),
        description: "Five questions about the stream".into(),
        donation_link: None,
        prize: Some("A mug".into()),
        branding: BrandingEntity::default(),
        terms_text: "Be nice".into(),
        is_public: true,
        allowed_host_ids: Vec::new(),
        entry_limit,
        scoring_mode,
        starts_at: None,
        ends_at: None,
        is_closed: false,
        created_at: SystemTime::now(),
    }
}

fn question(game_id: Uuid, text: &str, correct: &str, order: u64) -> QuestionEntity {
    QuestionEntity {
        id: Uuid::new_v4(),
        game_id,
        question_text: text.into(),
        input_kind: InputKind::Text,
        correct_answer: Some(correct.into()),
        options: None,
        min_value: None,
        max_value: None,
        is_tiebreaker: false,
        created_at: SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(order),
    }
}

/// Seed a game with questions and activate it on the test channel.
async fn activate(harness: &Harness, game: &GameEntity, questions: &[QuestionEntity]) {
    harness.store.insert_game(game.clone());
    for q in questions {
        harness.store.insert_question(q.clone());
    }

    panel_service::bootstrap(&harness.state, CHANNEL, CHANNEL, Role::Streamer)
        .await
        .expect("streamer bootstrap");
    streamer_service::activate_game(&harness.state, CHANNEL, Role::Streamer, game.id)
        .await
        .expect("activation");
}

fn form(email: &str) -> UserFormRequest {
    UserFormRequest {
        email: email.into(),
        terms_accepted: true,
        email_consent: true,
    }
}

#[tokio::test]
async fn full_attempt_scores_three_of_five_and_persists_rows() {
    let harness = harness().await;
    let game = game(None, ScoringMode::FreeToPlay);
    let questions: Vec<_> = [
        ("Capital of France?", "Paris"),
        ("Answer to everything?", "42"),
        ("Sky color?", "blue"),
        ("Lucky number?", "7"),
        ("Is this fun?", "yes"),
    ]
    .iter()
    .enumerate()
    .map(|(i, (text, correct))| question(game.id, text, correct, i as u64))
    .collect();
    activate(&harness, &game, &questions).await;

    let session = panel_service::bootstrap(&harness.state, "viewer-1", CHANNEL, Role::Viewer)
        .await
        .unwrap();
    assert_eq!(session.display_name, "User_viewer-1");
    assert_eq!(session.game.expect("active game").id, game.id);

    let snapshot = viewer_service::open_flow(&harness.state, "viewer-1", CHANNEL)
        .await
        .unwrap();
    assert_eq!(snapshot.step, FlowStepDto::Info);
    assert_eq!(snapshot.attempt_number, 1);

    let snapshot = viewer_service::start(&harness.state, "viewer-1", CHANNEL)
        .await
        .unwrap();
    assert_eq!(snapshot.step, FlowStepDto::Questions);
    assert_eq!(snapshot.question_index, Some(0));

    // Three correct, one case mismatch, one wrong.
    let answers = ["Paris", "42", "Blue", "8", "yes"];
    for (question, answer) in questions.iter().zip(answers) {
        viewer_service::answer(
            &harness.state,
            "viewer-1",
            CHANNEL,
            AnswerRequest {
                question_id: question.id,
                answer: answer.into(),
            },
        )
        .await
        .unwrap();
    }

    let snapshot = viewer_service::submit(&harness.state, "viewer-1", CHANNEL, form("v@example.com"))
        .await
        .unwrap();
    assert_eq!(snapshot.step, FlowStepDto::Score);
    assert_eq!(snapshot.total_score, Some(3));

    let entries = harness.store.entries();
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|e| e.game_id == game.id && !e.is_paid));

    let scores = harness.store.scores();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].total_score, 3);
    assert_eq!(scores[0].attempt_number, 1);
    assert_eq!(scores[0].email.as_deref(), Some("v@example.com"));
}

#[tokio::test]
async fn entry_limit_disables_retry_and_forces_score_on_reload() {
    let harness = harness().await;
    let game = game(Some(1), ScoringMode::FreeToPlay);
    let questions = vec![question(game.id, "q", "a", 0)];
    activate(&harness, &game, &questions).await;

    panel_service::bootstrap(&harness.state, "viewer-2", CHANNEL, Role::Viewer)
        .await
        .unwrap();
    viewer_service::open_flow(&harness.state, "viewer-2", CHANNEL)
        .await
        .unwrap();
    viewer_service::start(&harness.state, "viewer-2", CHANNEL)
        .await
        .unwrap();
    viewer_service::answer(
        &harness.state,
        "viewer-2",
        CHANNEL,
        AnswerRequest {
            question_id: questions[0].id,
            answer: "a".into(),
        },
    )
    .await
    .unwrap();
    let snapshot = viewer_service::submit(&harness.state, "viewer-2", CHANNEL, form("x@example.com"))
        .await
        .unwrap();
    assert!(!snapshot.can_retry);

    let err = viewer_service::retry(&harness.state, "viewer-2", CHANNEL)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    // A fresh mount against the same store lands straight on the score step.
    let reloaded = AppState::new(AppConfig::default());
    reloaded
        .install_panel_store(Arc::new(harness.store.clone()))
        .await;
    let snapshot = viewer_service::open_flow(&reloaded, "viewer-2", CHANNEL)
        .await
        .unwrap();
    assert_eq!(snapshot.step, FlowStepDto::Score);
    assert_eq!(snapshot.total_score, Some(1));
    assert!(!snapshot.can_retry);
}

#[tokio::test]
async fn empty_email_fails_validation_before_any_write() {
    let request = form("");
    assert!(request.validate().is_err());

    let request = UserFormRequest {
        email: "v@example.com".into(),
        terms_accepted: false,
        email_consent: false,
    };
    assert!(request.validate().is_err());
}

#[tokio::test]
async fn donation_required_games_rank_only_paid_attempts() {
    let harness = harness().await;
    let game = game(None, ScoringMode::DonationRequired);
    let questions = vec![question(game.id, "q", "a", 0)];
    activate(&harness, &game, &questions).await;

    panel_service::bootstrap(&harness.state, "viewer-3", CHANNEL, Role::Viewer)
        .await
        .unwrap();
    viewer_service::open_flow(&harness.state, "viewer-3", CHANNEL)
        .await
        .unwrap();
    viewer_service::start(&harness.state, "viewer-3", CHANNEL)
        .await
        .unwrap();
    viewer_service::answer(
        &harness.state,
        "viewer-3",
        CHANNEL,
        AnswerRequest {
            question_id: questions[0].id,
            answer: "a".into(),
        },
    )
    .await
    .unwrap();
    viewer_service::submit(&harness.state, "viewer-3", CHANNEL, form("d@example.com"))
        .await
        .unwrap();

    let board = leaderboard_service::fetch(&harness.state, game.id, Some("viewer-3"))
        .await
        .unwrap();
    assert!(board.entries.is_empty());

    panel_service::confirm_payment(
        &harness.state,
        "viewer-3",
        &CheckoutCallbackRequest {
            game_id: game.id,
            checkout_session_id: "cs_123".into(),
        },
    )
    .await
    .unwrap();

    let board = leaderboard_service::fetch(&harness.state, game.id, Some("viewer-3"))
        .await
        .unwrap();
    assert_eq!(board.entries.len(), 1);
    assert_eq!(board.entries[0].rank, 1);
    assert!(board.entries[0].is_current_user);

    let entries = harness.store.entries();
    assert!(entries
        .iter()
        .all(|e| e.is_paid && e.checkout_session_id.as_deref() == Some("cs_123")));
}
