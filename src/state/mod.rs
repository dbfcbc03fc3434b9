pub mod clue;
pub mod game;
mod sse;
pub mod state_machine;

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::{Notify, RwLock, mpsc, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::game_store::GameStore,
    dto::{board::BoardSnapshot, ws::BridgeOutboundMessage},
    services::{
        bridge_service::{BridgeError, send_message_to_websocket},
        event_loop::RefereeInput,
        sse_events,
    },
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Capacity of the referee inbox; the bridge reader waits when it is full.
const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Clone)]
/// Handle used to push actions to the connected chat bridge.
pub struct BridgeConnection {
    pub id: Uuid,
    pub bot_name: String,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state shared by the HTTP handlers, the bridge socket and the referee task.
pub struct AppState {
    config: AppConfig,
    bridge_token: Option<String>,
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    sse: SseHub,
    bridge: RwLock<Option<BridgeConnection>>,
    board: watch::Sender<BoardSnapshot>,
    degraded: watch::Sender<bool>,
    events: mpsc::Sender<RefereeInput>,
    shutdown: Notify,
}

impl AppState {
    /// Construct the shared state along with the inbox consumed by the referee task.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        bridge_token: Option<String>,
    ) -> (SharedState, mpsc::Receiver<RefereeInput>) {
        let (degraded_tx, _rx) = watch::channel(true);
        let (board_tx, _rx) = watch::channel(BoardSnapshot::default());
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let state = Arc::new(Self {
            config,
            bridge_token,
            game_store: RwLock::new(None),
            sse: SseHub::new(16),
            bridge: RwLock::new(None),
            board: board_tx,
            degraded: degraded_tx,
            events: events_tx,
            shutdown: Notify::new(),
        });
        (state, events_rx)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared secret the bridge must present, if one is configured.
    pub fn bridge_token(&self) -> Option<&str> {
        self.bridge_token.as_deref()
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
        if changed {
            sse_events::broadcast_system_status(self, value);
        }
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Latest board published by the referee.
    pub fn board(&self) -> BoardSnapshot {
        self.board.borrow().clone()
    }

    /// Store a new board and notify SSE subscribers when it differs from the previous one.
    pub fn publish_board(&self, snapshot: BoardSnapshot) {
        let changed = self.board.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot.clone();
            true
        });
        if changed {
            sse_events::broadcast_board(self, &snapshot);
        }
    }

    /// Register the chat bridge, closing any previous connection.
    pub async fn attach_bridge(&self, connection: BridgeConnection) {
        let bot_name = connection.bot_name.clone();
        let previous = self.bridge.write().await.replace(connection);
        if let Some(previous) = previous {
            warn!(id = %previous.id, "replacing existing bridge connection");
            let _ = previous.tx.send(Message::Close(None));
        }
        sse_events::broadcast_bridge_status(self, Some(bot_name));
    }

    /// Forget the bridge registered under `id`; a newer connection is left alone.
    pub async fn detach_bridge(&self, id: Uuid) {
        let mut guard = self.bridge.write().await;
        if guard.as_ref().is_some_and(|bridge| bridge.id == id) {
            guard.take();
            drop(guard);
            sse_events::broadcast_bridge_status(self, None);
        }
    }

    pub async fn bridge_connected(&self) -> bool {
        self.bridge.read().await.is_some()
    }

    /// Queue an action on the connected bridge.
    pub async fn send_to_bridge(&self, message: &BridgeOutboundMessage) -> Result<(), BridgeError> {
        let Some(tx) = self.bridge.read().await.as_ref().map(|bridge| bridge.tx.clone()) else {
            return Err(BridgeError::NotConnected);
        };
        send_message_to_websocket(&tx, message)
    }

    /// Hand an input to the referee task.
    pub async fn submit(&self, input: RefereeInput) {
        if self.events.send(input).await.is_err() {
            warn!("referee task stopped; input dropped");
        }
    }

    /// Ask the server to stop.
    pub fn request_shutdown(&self) {
        info!("shutdown requested from chat");
        self.shutdown.notify_one();
    }

    /// Resolve once [`AppState::request_shutdown`] has been called.
    pub async fn shutdown_requested(&self) {
        self.shutdown.notified().await;
    }
}
