use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        board::BoardSnapshot,
        sse::{BridgeStatus, ServerEvent, SystemStatus},
    },
    state::AppState,
};

const EVENT_BOARD: &str = "board";
const EVENT_SYSTEM_STATUS: &str = "system_status";
const EVENT_BRIDGE_STATUS: &str = "bridge_status";

/// Broadcast the full board after the referee changed it.
pub fn broadcast_board(state: &AppState, board: &BoardSnapshot) {
    send_public_event(state, EVENT_BOARD, board);
}

/// Broadcast that the backend entered or left degraded mode.
pub fn broadcast_system_status(state: &AppState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

/// Broadcast that the chat bridge connected (`Some(bot name)`) or dropped.
pub fn broadcast_bridge_status(state: &AppState, bot_name: Option<String>) {
    let payload = BridgeStatus {
        connected: bot_name.is_some(),
        bot_name,
    };
    send_public_event(state, EVENT_BRIDGE_STATUS, &payload);
}

fn send_public_event(state: &AppState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
