//! Abstraction over the external relational store.
//!
//! The panel persists everything in five logical tables (users, games,
//! questions, entries, scores). Backends only need row-level filtered
//! selects, inserts, and updates; change notifications are fanned out
//! in-process by [`crate::state::ChangeHub`] after each write.

#[cfg(feature = "memory-store")]
pub mod memory;
#[cfg(feature = "rest-store")]
pub mod rest;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{EntryEntity, GameEntity, QuestionEntity, ScoreEntity, UserEntity};
use crate::dao::storage::StorageResult;

/// Persistence operations used by the panel services.
pub trait PanelStore: Send + Sync {
    /// Look up a user by host platform identity.
    fn find_user_by_host_id(
        &self,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Insert a freshly sighted user.
    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Record the email captured on the user form.
    fn update_user_email(
        &self,
        user_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Point a streamer's channel at a new active game.
    fn set_active_game(
        &self,
        host_id: String,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a game by id.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Games visible to a host id (public OR allow-listed), newest first.
    fn list_eligible_games(
        &self,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Questions of a game in creation order.
    fn list_questions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    /// Persist one attempt's answers as a batch.
    fn insert_entries(&self, entries: Vec<EntryEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Persist the score row of a completed attempt.
    fn insert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// All score rows of a game, every attempt included.
    fn list_scores(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Latest attempt of a viewer in a game, by attempt number.
    fn find_latest_score(
        &self,
        game_id: Uuid,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>>;
    /// Users matching the given host ids; used to join display names.
    fn list_users_by_host_ids(
        &self,
        host_ids: Vec<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;
    /// Stamp the checkout session on a viewer's unpaid entries and flag
    /// them paid.
    fn mark_entries_paid(
        &self,
        host_id: String,
        checkout_session_id: String,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Flag all of a viewer's score rows as paid.
    fn mark_scores_paid(&self, host_id: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap connectivity probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a dropped connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
