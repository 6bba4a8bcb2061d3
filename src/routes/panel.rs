use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    context::HostContext,
    dto::{
        streamer::ActionResponse,
        viewer::{CheckoutCallbackRequest, SessionResponse},
    },
    error::AppError,
    services::panel_service,
    state::SharedState,
};

/// Session bootstrap and donation callback endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/panel/session", get(get_session))
        .route("/panel/checkout/confirm", post(confirm_checkout))
}

#[utoipa::path(
    get,
    path = "/panel/session",
    tag = "panel",
    responses(
        (status = 200, description = "Resolved panel session", body = SessionResponse),
        (status = 401, description = "Identity could not be resolved"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Resolve the panel session: the user record and the channel's active game.
pub async fn get_session(
    State(state): State<SharedState>,
    context: HostContext,
) -> Result<Json<SessionResponse>, AppError> {
    let host_id = context.require_host_id()?;
    let channel_id = context.require_channel_id()?;
    let payload = panel_service::bootstrap(&state, host_id, channel_id, context.role).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    post,
    path = "/panel/checkout/confirm",
    tag = "panel",
    request_body = CheckoutCallbackRequest,
    responses(
        (status = 200, description = "Donation recorded", body = ActionResponse),
        (status = 401, description = "Identity could not be resolved"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Record a confirmed donation for the viewer's pending attempt.
pub async fn confirm_checkout(
    State(state): State<SharedState>,
    context: HostContext,
    Valid(Json(request)): Valid<Json<CheckoutCallbackRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    let host_id = context.require_host_id()?;
    panel_service::confirm_payment(&state, host_id, &request).await?;
    Ok(Json(ActionResponse {
        message: "donation recorded".into(),
    }))
}
