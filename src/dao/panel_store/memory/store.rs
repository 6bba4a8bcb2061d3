use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{EntryEntity, GameEntity, QuestionEntity, ScoreEntity, UserEntity},
    panel_store::PanelStore,
    storage::StorageResult,
};

#[derive(Default)]
struct Tables {
    users: Vec<UserEntity>,
    games: Vec<GameEntity>,
    questions: Vec<QuestionEntity>,
    entries: Vec<EntryEntity>,
    scores: Vec<ScoreEntity>,
}

/// Process-local store holding all five tables in plain vectors.
///
/// Locks are never held across await points; every operation copies the rows
/// it needs while holding the guard.
#[derive(Clone, Default)]
pub struct MemoryPanelStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryPanelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a game directly; games have no panel-facing creation
    /// surface, so fixtures and the dev harness seed them here.
    pub fn insert_game(&self, game: GameEntity) {
        self.tables.write().expect("memory store lock").games.push(game);
    }

    /// Provision a question for a seeded game.
    pub fn insert_question(&self, question: QuestionEntity) {
        self.tables
            .write()
            .expect("memory store lock")
            .questions
            .push(question);
    }

    /// Snapshot of all entry rows, newest last. Test helper.
    pub fn entries(&self) -> Vec<EntryEntity> {
        self.tables.read().expect("memory store lock").entries.clone()
    }

    /// Snapshot of all score rows, newest last. Test helper.
    pub fn scores(&self) -> Vec<ScoreEntity> {
        self.tables.read().expect("memory store lock").scores.clone()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        f(&self.tables.read().expect("memory store lock"))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        f(&mut self.tables.write().expect("memory store lock"))
    }
}

impl PanelStore for MemoryPanelStore {
    fn find_user_by_host_id(
        &self,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store.read(|t| t.users.iter().find(|u| u.host_id == host_id).cloned()))
        })
    }

    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.write(|t| t.users.push(user));
            Ok(())
        })
    }

    fn update_user_email(
        &self,
        user_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.write(|t| {
                if let Some(user) = t.users.iter_mut().find(|u| u.id == user_id) {
                    user.email = Some(email);
                }
            });
            Ok(())
        })
    }

    fn set_active_game(
        &self,
        host_id: String,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.write(|t| {
                if let Some(user) = t.users.iter_mut().find(|u| u.host_id == host_id) {
                    user.active_game_id = Some(game_id);
                }
            });
            Ok(())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.read(|t| t.games.iter().find(|g| g.id == id).cloned())) })
    }

    fn list_eligible_games(
        &self,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut games = store.read(|t| {
                t.games
                    .iter()
                    .filter(|g| g.is_eligible_for(&host_id))
                    .cloned()
                    .collect::<Vec<_>>()
            });
            games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(games)
        })
    }

    fn list_questions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut questions = store.read(|t| {
                t.questions
                    .iter()
                    .filter(|q| q.game_id == game_id)
                    .cloned()
                    .collect::<Vec<_>>()
            });
            questions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(questions)
        })
    }

    fn insert_entries(&self, entries: Vec<EntryEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.write(|t| t.entries.extend(entries));
            Ok(())
        })
    }

    fn insert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.write(|t| t.scores.push(score));
            Ok(())
        })
    }

    fn list_scores(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store.read(|t| {
                t.scores
                    .iter()
                    .filter(|s| s.game_id == game_id)
                    .cloned()
                    .collect()
            }))
        })
    }

    fn find_latest_score(
        &self,
        game_id: Uuid,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store.read(|t| {
                t.scores
                    .iter()
                    .filter(|s| s.game_id == game_id && s.host_id == host_id)
                    .max_by_key(|s| s.attempt_number)
                    .cloned()
            }))
        })
    }

    fn list_users_by_host_ids(
        &self,
        host_ids: Vec<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store.read(|t| {
                t.users
                    .iter()
                    .filter(|u| host_ids.iter().any(|id| *id == u.host_id))
                    .cloned()
                    .collect()
            }))
        })
    }

    fn mark_entries_paid(
        &self,
        host_id: String,
        checkout_session_id: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.write(|t| {
                for entry in t
                    .entries
                    .iter_mut()
                    .filter(|e| e.host_id == host_id && e.checkout_session_id.is_none())
                {
                    entry.is_paid = true;
                    entry.checkout_session_id = Some(checkout_session_id.clone());
                }
            });
            Ok(())
        })
    }

    fn mark_scores_paid(&self, host_id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.write(|t| {
                for score in t.scores.iter_mut().filter(|s| s.host_id == host_id) {
                    score.is_paid = true;
                }
            });
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::dao::models::{BrandingEntity, Role, ScoringMode};

    fn game(is_public: bool, allowed: &[&str], age: Duration) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            title: "g".into(),
            description: String::new(),
            donation_link: None,
            prize: None,
            branding: BrandingEntity::default(),
            terms_text: String::new(),
            is_public,
            allowed_host_ids: allowed.iter().map(|s| s.to_string()).collect(),
            entry_limit: None,
            scoring_mode: ScoringMode::FreeToPlay,
            starts_at: None,
            ends_at: None,
            is_closed: false,
            created_at: SystemTime::now() - age,
        }
    }

    #[tokio::test]
    async fn eligible_games_are_filtered_and_newest_first() {
        let store = MemoryPanelStore::new();
        let public_old = game(true, &[], Duration::from_secs(3600));
        let private_for_x = game(false, &["X"], Duration::from_secs(60));
        store.insert_game(public_old.clone());
        store.insert_game(private_for_x.clone());

        let for_x = store.list_eligible_games("X".into()).await.unwrap();
        assert_eq!(
            for_x.iter().map(|g| g.id).collect::<Vec<_>>(),
            vec![private_for_x.id, public_old.id]
        );

        let for_y = store.list_eligible_games("Y".into()).await.unwrap();
        assert_eq!(
            for_y.iter().map(|g| g.id).collect::<Vec<_>>(),
            vec![public_old.id]
        );
    }

    #[tokio::test]
    async fn latest_score_picks_highest_attempt_number() {
        let store = MemoryPanelStore::new();
        let game_id = Uuid::new_v4();
        for attempt in [2, 1, 3] {
            store
                .insert_score(ScoreEntity {
                    id: Uuid::new_v4(),
                    game_id,
                    user_id: Uuid::new_v4(),
                    host_id: "viewer".into(),
                    total_score: attempt,
                    tiebreaker_guess: None,
                    is_paid: false,
                    is_winner: false,
                    attempt_number: attempt,
                    email: None,
                    email_consent_at: None,
                    terms_accepted_at: None,
                    created_at: SystemTime::now(),
                })
                .await
                .unwrap();
        }

        let latest = store
            .find_latest_score(game_id, "viewer".into())
            .await
            .unwrap()
            .expect("score present");
        assert_eq!(latest.attempt_number, 3);
    }

    #[tokio::test]
    async fn user_creation_and_activation_round_trip() {
        let store = MemoryPanelStore::new();
        let user = UserEntity {
            id: Uuid::new_v4(),
            host_id: "987654321".into(),
            email: None,
            display_name: UserEntity::placeholder_name("987654321"),
            role: Role::Streamer,
            active_game_id: None,
            created_at: SystemTime::now(),
        };
        store.insert_user(user.clone()).await.unwrap();

        let game_id = Uuid::new_v4();
        store
            .set_active_game("987654321".into(), game_id)
            .await
            .unwrap();

        let found = store
            .find_user_by_host_id("987654321".into())
            .await
            .unwrap()
            .expect("user present");
        assert_eq!(found.active_game_id, Some(game_id));
        assert_eq!(found.display_name, "User_98765432");
    }
}
