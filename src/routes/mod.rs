use axum::Router;

use crate::state::SharedState;

pub mod bridge;
pub mod docs;
pub mod game;
pub mod health;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(bridge::router())
        .merge(game::router())
        .merge(docs::router());

    api_router.with_state(state)
}
