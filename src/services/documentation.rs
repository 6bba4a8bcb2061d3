use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz panel backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::panel::get_session,
        crate::routes::panel::confirm_checkout,
        crate::routes::viewer::get_flow,
        crate::routes::viewer::start_flow,
        crate::routes::viewer::answer_question,
        crate::routes::viewer::submit_form,
        crate::routes::viewer::retry_flow,
        crate::routes::streamer::list_games,
        crate::routes::streamer::activate_game,
        crate::routes::leaderboard::get_leaderboard,
        crate::routes::leaderboard::stream_leaderboard,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::BrandingDto,
            crate::dto::game::GameSummary,
            crate::dto::viewer::SessionResponse,
            crate::dto::viewer::QuestionDto,
            crate::dto::viewer::FlowStepDto,
            crate::dto::viewer::FlowSnapshot,
            crate::dto::viewer::AnswerRequest,
            crate::dto::viewer::UserFormRequest,
            crate::dto::viewer::CheckoutCallbackRequest,
            crate::dto::streamer::GameListItem,
            crate::dto::streamer::ActivateGameRequest,
            crate::dto::streamer::ActionResponse,
            crate::dto::leaderboard::LeaderboardEntry,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dao::models::Role,
            crate::dao::models::ScoringMode,
            crate::dao::models::InputKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "panel", description = "Session bootstrap and donation callbacks"),
        (name = "viewer", description = "Viewer game flow"),
        (name = "streamer", description = "Streamer game management"),
        (name = "leaderboard", description = "Leaderboard reads and streams"),
    )
)]
pub struct ApiDoc;
