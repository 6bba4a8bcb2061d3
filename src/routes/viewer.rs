use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    context::HostContext,
    dto::viewer::{AnswerRequest, FlowSnapshot, UserFormRequest},
    error::AppError,
    services::viewer_service,
    state::SharedState,
};

/// Viewer flow endpoints: one snapshot read plus the four flow mutations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/viewer/flow", get(get_flow))
        .route("/viewer/flow/start", post(start_flow))
        .route("/viewer/flow/answer", post(answer_question))
        .route("/viewer/flow/submit", post(submit_form))
        .route("/viewer/flow/retry", post(retry_flow))
}

#[utoipa::path(
    get,
    path = "/viewer/flow",
    tag = "viewer",
    responses(
        (status = 200, description = "Current flow state", body = FlowSnapshot),
        (status = 404, description = "No active game on this channel"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Current state of the viewer's flow, opening a session when none is live.
pub async fn get_flow(
    State(state): State<SharedState>,
    context: HostContext,
) -> Result<Json<FlowSnapshot>, AppError> {
    let host_id = context.require_host_id()?;
    let channel_id = context.require_channel_id()?;
    let payload = viewer_service::open_flow(&state, host_id, channel_id).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    post,
    path = "/viewer/flow/start",
    tag = "viewer",
    responses(
        (status = 200, description = "Attempt started", body = FlowSnapshot),
        (status = 409, description = "Not on the info step or attempts exhausted")
    )
)]
/// Begin an attempt from the info step.
pub async fn start_flow(
    State(state): State<SharedState>,
    context: HostContext,
) -> Result<Json<FlowSnapshot>, AppError> {
    let host_id = context.require_host_id()?;
    let channel_id = context.require_channel_id()?;
    let payload = viewer_service::start(&state, host_id, channel_id).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    post,
    path = "/viewer/flow/answer",
    tag = "viewer",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = FlowSnapshot),
        (status = 400, description = "Answer targets the wrong question"),
        (status = 409, description = "Not on the questions step")
    )
)]
/// Record the answer to the question at the cursor.
pub async fn answer_question(
    State(state): State<SharedState>,
    context: HostContext,
    Valid(Json(request)): Valid<Json<AnswerRequest>>,
) -> Result<Json<FlowSnapshot>, AppError> {
    let host_id = context.require_host_id()?;
    let channel_id = context.require_channel_id()?;
    let payload = viewer_service::answer(&state, host_id, channel_id, request).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    post,
    path = "/viewer/flow/submit",
    tag = "viewer",
    request_body = UserFormRequest,
    responses(
        (status = 200, description = "Attempt scored and persisted", body = FlowSnapshot),
        (status = 400, description = "Missing email or terms not accepted"),
        (status = 409, description = "Not on the user form step")
    )
)]
/// Complete the attempt: score the answers and persist the entry and score rows.
pub async fn submit_form(
    State(state): State<SharedState>,
    context: HostContext,
    Valid(Json(request)): Valid<Json<UserFormRequest>>,
) -> Result<Json<FlowSnapshot>, AppError> {
    let host_id = context.require_host_id()?;
    let channel_id = context.require_channel_id()?;
    let payload = viewer_service::submit(&state, host_id, channel_id, request).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    post,
    path = "/viewer/flow/retry",
    tag = "viewer",
    responses(
        (status = 200, description = "Flow reset to the info step", body = FlowSnapshot),
        (status = 409, description = "Entry limit reached")
    )
)]
/// Start the game over, consuming one more attempt.
pub async fn retry_flow(
    State(state): State<SharedState>,
    context: HostContext,
) -> Result<Json<FlowSnapshot>, AppError> {
    let host_id = context.require_host_id()?;
    let channel_id = context.require_channel_id()?;
    let payload = viewer_service::retry(&state, host_id, channel_id).await?;
    Ok(Json(payload))
}
