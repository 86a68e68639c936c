/// WebSocket connection lifecycle
///
/// Each client opens a single connection at `GET /ws`. The connection moves
/// through three states: open-unauthenticated, open-authenticated (after the
/// client's auth message registers it), and closed (transport close or error
/// unregisters it).
///
/// Outbound traffic goes through a per-connection unbounded queue: the
/// dispatcher and the lifecycle code enqueue `ServerMessage`s, and a spawned
/// pump task serializes them onto the socket. Request handlers therefore
/// never await socket I/O.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::message::{ClientMessage, ServerMessage};
use super::registry::ConnectionRegistry;
use crate::app::AppState;

/// WebSocket upgrade handler for `GET /ws`
///
/// The upgrade itself is unauthenticated; the connection is bound to a user
/// only once the client sends its auth message.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let registry = Arc::clone(&state.registry);
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

/// Drives a single connection from open to close
async fn handle_socket(socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    tracing::debug!("WebSocket client connected");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Acknowledge the connection before anything else
    let _ = tx.send(ServerMessage::Connected);

    // Outbound pump: everything queued for this connection is serialized and
    // written here, so enqueueing never blocks.
    let outbound = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize server message");
                    continue;
                }
            };

            if sink.send(Message::Text(text)).await.is_err() {
                // Transport is gone; the inbound loop will observe the close
                break;
            }
        }
    });

    // Inbound loop: the only expected message is a single auth frame.
    // Malformed frames are logged and ignored without closing the connection.
    let mut authenticated = false;
    while let Some(incoming) = stream.next().await {
        match incoming {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Auth { user_id }) => {
                    if authenticated {
                        tracing::debug!(
                            user_id = %user_id,
                            "Ignoring auth message on already-authenticated connection"
                        );
                        continue;
                    }

                    registry.register(user_id, tx.clone());
                    authenticated = true;
                    tracing::info!(user_id = %user_id, "WebSocket connection authenticated");
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring malformed WebSocket message");
                }
            },
            Ok(Message::Close(_)) => break,
            // Ping/pong are handled by axum; binary frames are not part of
            // the protocol
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    registry.unregister(&tx);
    outbound.abort();
    tracing::debug!("WebSocket client disconnected");
}
