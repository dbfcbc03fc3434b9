use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::BridgeInboundMessage,
    services::event_loop::RefereeInput,
    state::{BridgeConnection, SharedState, game::ChatUser},
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure to deliver an action to the chat bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No bridge is connected.
    #[error("no chat bridge connected")]
    NotConnected,
    /// Writer channel closed while the connection was being torn down.
    #[error("bridge connection closed")]
    ConnectionClosed,
}

/// Handle the full lifecycle of the chat bridge WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound actions flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "bridge receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("bridge identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let inbound = match BridgeInboundMessage::from_json_str(&initial_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse or validate bridge identification");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let BridgeInboundMessage::Identification {
        token,
        bot_user_id,
        bot_name,
    } = inbound
    else {
        warn!("first bridge message was not identification");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    if let Some(expected) = state.bridge_token()
        && token.as_deref() != Some(expected)
    {
        warn!(bot_id = bot_user_id, "bridge presented an invalid token");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    }

    let connection_id = Uuid::new_v4();
    state
        .attach_bridge(BridgeConnection {
            id: connection_id,
            bot_name: bot_name.clone(),
            tx: outbound_tx.clone(),
        })
        .await;
    info!(id = %connection_id, bot_id = bot_user_id, bot_name = %bot_name, "bridge connected");

    state
        .submit(RefereeInput::Identified(ChatUser::new(bot_user_id, bot_name)))
        .await;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(id = %connection_id, payload = %text, "received bridge message");

                match BridgeInboundMessage::from_json_str(&text) {
                    Ok(BridgeInboundMessage::Identification { .. }) => {
                        warn!(id = %connection_id, "ignoring duplicate identification message");
                    }
                    Ok(msg) => {
                        if let Some(event) = msg.into_chat_event() {
                            state.submit(RefereeInput::Chat(event)).await;
                        }
                    }
                    Err(err) => {
                        warn!(id = %connection_id, error = %err, "failed to parse or validate bridge message");
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(id = %connection_id, "bridge closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(id = %connection_id, error = %err, "bridge websocket error");
                break;
            }
        }
    }

    state.detach_bridge(connection_id).await;
    info!(id = %connection_id, "bridge disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; only a closed writer is reported.
pub fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), BridgeError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| BridgeError::ConnectionClosed)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
