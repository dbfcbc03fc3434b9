use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};

use crate::{services::bridge_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/bridge",
    tag = "bridge",
    responses((status = 101, description = "Switching protocols to WebSocket"))
)]
/// Upgrade the HTTP connection into the chat bridge WebSocket session.
pub async fn bridge_handler(
    State(state): State<SharedState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| bridge_service::handle_socket(state, socket))
}

/// Configure the bridge endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/bridge", get(bridge_handler))
}
