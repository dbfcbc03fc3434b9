use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report degraded mode, logging archive or bridge problems on the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.game_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "archive health check failed");
            }
        }
        None => warn!("archive unavailable (degraded mode)"),
    }

    if !state.bridge_connected().await {
        warn!("no chat bridge connected");
    }

    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
