use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Contact referee.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::bridge::bridge_handler,
        crate::routes::game::current_board,
        crate::routes::game::game_stats,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::board::BoardSnapshot,
            crate::dto::board::ClueView,
            crate::dto::stats::GameStats,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::BridgeStatus,
            crate::dto::ws::BridgeInboundMessage,
            crate::dto::ws::BridgeOutboundMessage,
            crate::state::state_machine::GamePhase,
            crate::state::clue::ClueState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "bridge", description = "WebSocket used by the chat bridge"),
        (name = "game", description = "Read-only views of the current and archived games"),
    )
)]
pub struct ApiDoc;
