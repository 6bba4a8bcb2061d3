//! Session bootstrap and donation confirmation.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, Role, UserEntity},
    dto::{
        game::GameSummary,
        viewer::{CheckoutCallbackRequest, SessionResponse},
    },
    error::ServiceError,
    state::{ChangeEvent, FlowKey, SharedState},
};

/// Resolve the panel session: the user record behind the host identity and
/// the game currently activated on the channel.
///
/// Users are created on first sighting; the display name starts as a
/// placeholder until the host platform provides a real one.
pub async fn bootstrap(
    state: &SharedState,
    host_id: &str,
    channel_id: &str,
    role: Role,
) -> Result<SessionResponse, ServiceError> {
    let store = state.require_panel_store().await?;

    let user = match store.find_user_by_host_id(host_id.to_string()).await? {
        Some(user) => user,
        None => {
            let user = UserEntity {
                id: Uuid::new_v4(),
                host_id: host_id.to_string(),
                email: None,
                display_name: UserEntity::placeholder_name(host_id),
                role,
                active_game_id: None,
                created_at: SystemTime::now(),
            };
            store.insert_user(user.clone()).await?;
            state.changes().publish(ChangeEvent::users());
            info!(host_id, "created panel user on first sighting");
            user
        }
    };

    let game = active_game_for_channel(state, channel_id).await?;

    Ok(SessionResponse {
        display_name: user.display_name,
        role: user.role,
        game: game.as_ref().map(GameSummary::from),
    })
}

/// Game currently activated on a channel, resolved through the channel
/// owner's user record.
pub async fn active_game_for_channel(
    state: &SharedState,
    channel_id: &str,
) -> Result<Option<GameEntity>, ServiceError> {
    let store = state.require_panel_store().await?;

    let Some(owner) = store.find_user_by_host_id(channel_id.to_string()).await? else {
        return Ok(None);
    };
    let Some(game_id) = owner.active_game_id else {
        return Ok(None);
    };

    Ok(store.find_game(game_id).await?)
}

/// Mark a viewer's pending attempt as paid after the checkout provider
/// confirms the donation.
///
/// Entries are matched by checkout session; score rows are flagged
/// wholesale for the viewer. Live flow sessions pick up the flag too so
/// the panel reflects it without a reload.
pub async fn confirm_payment(
    state: &SharedState,
    host_id: &str,
    request: &CheckoutCallbackRequest,
) -> Result<(), ServiceError> {
    let store = state.require_panel_store().await?;

    store
        .mark_entries_paid(
            host_id.to_string(),
            request.checkout_session_id.clone(),
        )
        .await?;
    store.mark_scores_paid(host_id.to_string()).await?;

    let key = FlowKey {
        game_id: request.game_id,
        host_id: host_id.to_string(),
    };
    if let Some(handle) = state.existing_flow(&key) {
        handle.lock().await.mark_paid();
    }

    state.changes().publish(ChangeEvent::scores(request.game_id));
    info!(
        host_id,
        checkout_session = %request.checkout_session_id,
        "donation confirmed; attempt flagged as paid"
    );

    Ok(())
}
