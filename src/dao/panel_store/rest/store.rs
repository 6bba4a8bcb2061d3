use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use uuid::Uuid;

use crate::dao::{
    models::{EntryEntity, GameEntity, QuestionEntity, ScoreEntity, UserEntity},
    panel_store::PanelStore,
    storage::StorageResult,
};

use super::{
    config::RestConfig,
    error::{RestDaoError, RestResult},
    models::{
        ENTRIES_TABLE, EntryRow, GAMES_TABLE, GameRow, QUESTIONS_TABLE, QuestionRow, SCORES_TABLE,
        ScoreRow, USERS_TABLE, UserRow,
    },
};

/// Store client speaking the managed store's REST dialect.
#[derive(Clone)]
pub struct RestPanelStore {
    client: Client,
    base_url: Arc<str>,
}

impl RestPanelStore {
    /// Build the HTTP client and verify the store answers.
    pub async fn connect(config: RestConfig) -> RestResult<Self> {
        let mut headers = header::HeaderMap::new();
        let mut key_value = header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| RestDaoError::MissingEnvVar {
                var: "QUIZ_PANEL_REST_KEY",
            })?;
        key_value.set_sensitive(true);
        headers.insert("apikey", key_value);
        let mut bearer = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| RestDaoError::MissingEnvVar {
                var: "QUIZ_PANEL_REST_KEY",
            })?;
        bearer.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|source| RestDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
        };

        store.probe().await?;
        Ok(store)
    }

    fn request(&self, method: Method, table: &'static str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, table);
        self.client.request(method, url)
    }

    /// Minimal round trip confirming the endpoint and key are usable.
    async fn probe(&self) -> RestResult<()> {
        let response = self
            .request(Method::GET, GAMES_TABLE)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend {
                table: GAMES_TABLE,
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(RestDaoError::RequestStatus {
                table: GAMES_TABLE,
                status,
            }),
        }
    }

    async fn select<T>(&self, table: &'static str, query: &[(&str, String)]) -> RestResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, table)
            .query(query)
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend { table, source })?;

        if !response.status().is_success() {
            return Err(RestDaoError::RequestStatus {
                table,
                status: response.status(),
            });
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|source| RestDaoError::DecodeResponse { table, source })
    }

    async fn insert<T>(&self, table: &'static str, payload: &T) -> RestResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(payload)
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend { table, source })?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(RestDaoError::RequestStatus { table, status }),
        }
    }

    async fn update(
        &self,
        table: &'static str,
        query: &[(&str, String)],
        patch: serde_json::Value,
    ) -> RestResult<()> {
        let response = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=minimal")
            .query(query)
            .json(&patch)
            .send()
            .await
            .map_err(|source| RestDaoError::RequestSend { table, source })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RestDaoError::RequestStatus {
                table,
                status: response.status(),
            })
        }
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

impl PanelStore for RestPanelStore {
    fn find_user_by_host_id(
        &self,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows: Vec<UserRow> = store
                .select(USERS_TABLE, &[("host_id", eq(&host_id)), ("limit", "1".into())])
                .await?;
            Ok(rows
                .into_iter()
                .next()
                .map(UserRow::into_entity)
                .transpose()?)
        })
    }

    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let row = UserRow::from_entity(user);
            store.insert(USERS_TABLE, &row).await.map_err(Into::into)
        })
    }

    fn update_user_email(
        &self,
        user_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update(
                    USERS_TABLE,
                    &[("id", eq(user_id))],
                    json!({ "email": email }),
                )
                .await
                .map_err(Into::into)
        })
    }

    fn set_active_game(
        &self,
        host_id: String,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update(
                    USERS_TABLE,
                    &[("host_id", eq(&host_id))],
                    json!({ "active_game_id": game_id }),
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows: Vec<GameRow> = store
                .select(GAMES_TABLE, &[("id", eq(id)), ("limit", "1".into())])
                .await?;
            Ok(rows
                .into_iter()
                .next()
                .map(GameRow::into_entity)
                .transpose()?)
        })
    }

    fn list_eligible_games(
        &self,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            // Public games OR games whose allow-list contains this host id,
            // newest first.
            let rows: Vec<GameRow> = store
                .select(
                    GAMES_TABLE,
                    &[
                        (
                            "or",
                            format!("(is_public.eq.true,allowed_host_ids.cs.{{{host_id}}})"),
                        ),
                        ("order", "created_at.desc".into()),
                    ],
                )
                .await?;
            rows.into_iter()
                .map(|row| row.into_entity().map_err(Into::into))
                .collect()
        })
    }

    fn list_questions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows: Vec<QuestionRow> = store
                .select(
                    QUESTIONS_TABLE,
                    &[
                        ("game_id", eq(game_id)),
                        ("order", "created_at.asc".into()),
                    ],
                )
                .await?;
            rows.into_iter()
                .map(|row| row.into_entity().map_err(Into::into))
                .collect()
        })
    }

    fn insert_entries(&self, entries: Vec<EntryEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let rows: Vec<EntryRow> = entries.into_iter().map(EntryRow::from_entity).collect();
            store.insert(ENTRIES_TABLE, &rows).await.map_err(Into::into)
        })
    }

    fn insert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let row = ScoreRow::from_entity(score);
            store.insert(SCORES_TABLE, &row).await.map_err(Into::into)
        })
    }

    fn list_scores(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows: Vec<ScoreRow> = store
                .select(SCORES_TABLE, &[("game_id", eq(game_id))])
                .await?;
            rows.into_iter()
                .map(|row| row.into_entity().map_err(Into::into))
                .collect()
        })
    }

    fn find_latest_score(
        &self,
        game_id: Uuid,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows: Vec<ScoreRow> = store
                .select(
                    SCORES_TABLE,
                    &[
                        ("game_id", eq(game_id)),
                        ("host_id", eq(&host_id)),
                        ("order", "attempt_number.desc".into()),
                        ("limit", "1".into()),
                    ],
                )
                .await?;
            Ok(rows
                .into_iter()
                .next()
                .map(ScoreRow::into_entity)
                .transpose()?)
        })
    }

    fn list_users_by_host_ids(
        &self,
        host_ids: Vec<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            if host_ids.is_empty() {
                return Ok(Vec::new());
            }
            let joined = host_ids
                .iter()
                .map(|id| format!("\"{id}\""))
                .collect::<Vec<_>>()
                .join(",");
            let rows: Vec<UserRow> = store
                .select(USERS_TABLE, &[("host_id", format!("in.({joined})"))])
                .await?;
            rows.into_iter()
                .map(|row| row.into_entity().map_err(Into::into))
                .collect()
        })
    }

    fn mark_entries_paid(
        &self,
        host_id: String,
        checkout_session_id: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update(
                    ENTRIES_TABLE,
                    &[
                        ("host_id", eq(&host_id)),
                        ("checkout_session_id", "is.null".into()),
                    ],
                    json!({
                        "is_paid": true,
                        "checkout_session_id": checkout_session_id,
                    }),
                )
                .await
                .map_err(Into::into)
        })
    }

    fn mark_scores_paid(&self, host_id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update(
                    SCORES_TABLE,
                    &[("host_id", eq(&host_id))],
                    json!({ "is_paid": true }),
                )
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.probe().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.probe().await.map_err(Into::into) })
    }
}
