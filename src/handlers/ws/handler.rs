//! Axum WebSocket upgrade handler and the per-connection read loop.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::state::AppState;

use super::{
    messages::{IncomingMessage, OutgoingMessage},
    processor::handle_incoming_message,
    session::ConnectionSession,
};

/// Sized for audio workloads: bursts of chunk messages plus agent audio
/// responses should never make the read loop wait on the writer.
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Upgrade handler for `/ws/voice`.
pub async fn ws_voice_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("voice connection upgrade requested");
    ws.on_upgrade(move |socket| handle_voice_socket(socket, state))
}

/// Run one voice connection to completion.
async fn handle_voice_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let (message_tx, mut message_rx) = mpsc::channel::<OutgoingMessage>(CHANNEL_BUFFER_SIZE);

    // Writer task: serialization and socket writes happen off the read loop
    // so a slow client never delays interrupt handling.
    let sender_task = tokio::spawn(async move {
        while let Some(message) = message_rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("failed to serialize outgoing message: {e}");
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json.into())).await {
                error!("failed to send message: {e}");
                break;
            }
        }
    });

    let mut session = ConnectionSession::new();
    info!(visitor_id = %session.visitor_id, "voice connection established");

    while let Some(msg_result) = receiver.next().await {
        let msg = match msg_result {
            Ok(msg) => msg,
            Err(e) => {
                warn!("socket error: {e}");
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Ping/pong are handled by axum; binary frames are not part of
            // this protocol.
            _ => continue,
        };

        let incoming: IncomingMessage = match serde_json::from_str(&text) {
            Ok(incoming) => incoming,
            Err(e) => {
                let _ = message_tx
                    .send(OutgoingMessage::error(format!("malformed message: {e}")))
                    .await;
                continue;
            }
        };

        let keep_open =
            handle_incoming_message(incoming, &mut session, &message_tx, &app_state).await;
        if !keep_open {
            break;
        }
    }

    // Going away cancels whatever turn is still running.
    session.interrupt.raise();
    info!(visitor_id = %session.visitor_id, "voice connection closed");

    drop(message_tx);
    let _ = sender_task.await;
}
