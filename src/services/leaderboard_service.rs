//! Leaderboard projection and its realtime SSE feed.
//!
//! The projection is recomputed from scratch on every request and on every
//! score change notification; leaderboards are small enough that
//! incremental maintenance is not worth the bookkeeping.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{ScoreEntity, ScoringMode, UserEntity},
    dto::{
        leaderboard::{LeaderboardEntry, LeaderboardResponse},
        sse::ServerEvent,
    },
    error::ServiceError,
    state::{SharedState, TableKind},
};

/// Project score rows into the ranked leaderboard sequence.
///
/// Rows are sorted by score descending, ties broken by earliest creation
/// time. Under `donation_required` scoring, unpaid rows are dropped before
/// ranking and never consume a rank number.
pub fn project(
    scores: &[ScoreEntity],
    users: &[UserEntity],
    mode: ScoringMode,
    viewer_host_id: Option<&str>,
) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&ScoreEntity> = scores
        .iter()
        .filter(|score| mode == ScoringMode::FreeToPlay || score.is_paid)
        .collect();
    ranked.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then(a.created_at.cmp(&b.created_at))
    });

    ranked
        .into_iter()
        .enumerate()
        .map(|(position, score)| {
            let display_name = users
                .iter()
                .find(|user| user.host_id == score.host_id)
                .map(|user| user.display_name.clone())
                .unwrap_or_else(|| UserEntity::placeholder_name(&score.host_id));

            LeaderboardEntry {
                host_id: score.host_id.clone(),
                display_name,
                total_score: score.total_score,
                rank: position + 1,
                is_current_user: viewer_host_id == Some(score.host_id.as_str()),
            }
        })
        .collect()
}

/// Fetch and project the leaderboard of one game.
pub async fn fetch(
    state: &SharedState,
    game_id: Uuid,
    viewer_host_id: Option<&str>,
) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_panel_store().await?;

    let game = store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("game not found".into()))?;
    let scores = store.list_scores(game_id).await?;

    let mut host_ids: Vec<String> = scores.iter().map(|score| score.host_id.clone()).collect();
    host_ids.sort();
    host_ids.dedup();
    let users = store.list_users_by_host_ids(host_ids).await?;

    let mut entries = project(&scores, &users, game.scoring_mode, viewer_host_id);
    if let Some(limit) = state.config().leaderboard_limit {
        entries.truncate(limit);
    }

    Ok(LeaderboardResponse { entries })
}

/// Stream the leaderboard over SSE, re-projecting on every score change
/// notification for the game.
///
/// The subscription lives exactly as long as the response stream; when the
/// client disconnects the forwarder task ends and the broadcast receiver
/// is dropped with it.
pub fn stream(
    state: SharedState,
    game_id: Uuid,
    viewer_host_id: Option<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let keepalive = Duration::from_secs(state.config().sse_keepalive_secs);
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        let mut changes = state.changes().subscribe();

        // Initial projection so the client has something to render before
        // the first change arrives.
        if !send_projection(&state, game_id, viewer_host_id.as_deref(), &tx).await {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                received = changes.recv() => {
                    match received {
                        Ok(event) if event.matches(TableKind::Scores, game_id) => {
                            if !send_projection(&state, game_id, viewer_host_id.as_deref(), &tx).await {
                                break;
                            }
                        }
                        Ok(_) => continue,
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // A full re-projection catches the stream up.
                            if !send_projection(&state, game_id, viewer_host_id.as_deref(), &tx).await {
                                break;
                            }
                        }
                    }
                }
            }
        }

        info!(%game_id, "leaderboard SSE stream disconnected");
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(keepalive)
            .text("keep-alive"),
    )
}

/// Project and push one leaderboard event, returning whether the client is
/// still connected.
async fn send_projection(
    state: &SharedState,
    game_id: Uuid,
    viewer_host_id: Option<&str>,
    tx: &mpsc::Sender<Result<Event, Infallible>>,
) -> bool {
    let response = match fetch(state, game_id, viewer_host_id).await {
        Ok(response) => response,
        Err(err) => {
            warn!(%game_id, error = %err, "leaderboard projection failed; keeping stream alive");
            return !tx.is_closed();
        }
    };

    let payload = match ServerEvent::json("leaderboard".to_string(), &response) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(%game_id, error = %err, "failed to serialise leaderboard event");
            return !tx.is_closed();
        }
    };

    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    tx.send(Ok(event)).await.is_ok()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use crate::dao::models::Role;

    use super::*;

    fn score(host_id: &str, total: u32, paid: bool, offset_secs: u64) -> ScoreEntity {
        ScoreEntity {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            host_id: host_id.into(),
            total_score: total,
            tiebreaker_guess: None,
            is_paid: paid,
            is_winner: false,
            attempt_number: 1,
            email: None,
            email_consent_at: None,
            terms_accepted_at: None,
            created_at: SystemTime::UNIX_EPOCH + Duration::from_secs(offset_secs),
        }
    }

    fn user(host_id: &str, display_name: &str) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            host_id: host_id.into(),
            email: None,
            display_name: display_name.into(),
            role: Role::Viewer,
            active_game_id: None,
            created_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn sorts_by_score_desc_then_earliest_submission() {
        let scores = vec![
            score("late", 5, false, 200),
            score("early", 5, false, 100),
            score("top", 9, false, 300),
        ];

        let entries = project(&scores, &[], ScoringMode::FreeToPlay, None);
        let order: Vec<&str> = entries.iter().map(|e| e.host_id.as_str()).collect();
        assert_eq!(order, ["top", "early", "late"]);
        assert_eq!(
            entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[test]
    fn donation_required_drops_unpaid_rows_without_consuming_ranks() {
        let scores = vec![
            score("paid-high", 8, true, 100),
            score("unpaid", 9, false, 100),
            score("paid-low", 3, true, 100),
        ];

        let entries = project(&scores, &[], ScoringMode::DonationRequired, None);
        let order: Vec<&str> = entries.iter().map(|e| e.host_id.as_str()).collect();
        assert_eq!(order, ["paid-high", "paid-low"]);
        assert_eq!(entries[1].rank, 2);
    }

    #[test]
    fn display_names_fall_back_to_the_placeholder() {
        let scores = vec![score("123456789", 1, false, 0), score("known", 2, false, 0)];
        let users = vec![user("known", "StreamFan")];

        let entries = project(&scores, &users, ScoringMode::FreeToPlay, None);
        assert_eq!(entries[0].display_name, "StreamFan");
        assert_eq!(entries[1].display_name, "User_12345678");
    }

    #[test]
    fn requesting_viewer_row_is_flagged() {
        let scores = vec![score("me", 1, false, 0), score("them", 2, false, 0)];

        let entries = project(&scores, &[], ScoringMode::FreeToPlay, Some("me"));
        assert!(entries.iter().any(|e| e.host_id == "me" && e.is_current_user));
        assert!(entries.iter().all(|e| e.host_id == "me" || !e.is_current_user));
    }
}
