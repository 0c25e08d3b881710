use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Arcade Rank Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::submit_score,
        crate::routes::game::get_rankings,
        crate::routes::game::get_player_scores,
        crate::routes::sse::rankings_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::ScoreSubmission,
            crate::dto::game::ScoreSubmittedResponse,
            crate::dto::game::RankingEntry,
            crate::dto::game::PlayerScoreEntry,
            crate::dto::sse::RankingsEvent,
            crate::dto::sse::Handshake,
            crate::dto::ws::GameInboundMessage,
            crate::dto::ws::GameOutboundMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Score submission and ranking queries"),
        (name = "sse", description = "Server-sent events rankings streams"),
        (name = "ws", description = "WebSocket operations for game clients"),
    )
)]
pub struct ApiDoc;
