//! WebSocket handling for game clients.
//!
//! Each connection gets a writer task draining its outbound queue and a reader loop that turns
//! inbound frames into hub calls. All game state lives in the hub.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use connect4_domain::ConnectionId;
use connect4_shared::{ClientMessage, ServerFrame};

use crate::app::App;

#[cfg(test)]
mod test_support;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// Inbound frames above this size close the connection.
const MAX_MESSAGE_SIZE: usize = 512;

const PING_INTERVAL: Duration = Duration::from_secs(54);

/// A peer silent for this long is treated as gone.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// WebSocket upgrade handler - entry point for client connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app): State<Arc<App>>) -> Response {
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: Arc<App>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = ConnectionId::new();

    // The hub owns the only sender; dropping it there ends the writer.
    let (tx, mut rx) = mpsc::channel::<ServerFrame>(CONNECTION_CHANNEL_BUFFER);
    app.hub.register(connection_id, tx).await;

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let send_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval_at(
            tokio::time::Instant::now() + PING_INTERVAL,
            PING_INTERVAL,
        );
        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(frame) = frame else {
                        let _ = ws_sender.send(Message::Close(None)).await;
                        break;
                    };
                    match serde_json::to_string(&frame) {
                        Ok(json) => {
                            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::error!(
                                connection_id = %connection_id,
                                error = %e,
                                "Failed to serialize frame"
                            );
                        }
                    }
                }
                _ = ping.tick() => {
                    let ping = Message::Ping(Default::default());
                    if ws_sender.send(ping).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    loop {
        let next = match tokio::time::timeout(READ_TIMEOUT, ws_receiver.next()).await {
            Ok(next) => next,
            Err(_) => {
                tracing::warn!(connection_id = %connection_id, "WebSocket read timed out");
                break;
            }
        };
        let Some(result) = next else {
            break;
        };
        match result {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(msg) => handle_message(msg, &app, connection_id).await,
                    Err(e) => {
                        tracing::warn!(
                            connection_id = %connection_id,
                            error = %e,
                            "Ignoring malformed message"
                        );
                    }
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            // Pongs and pings only refresh the read deadline
            Ok(_) => {}
        }
    }

    app.hub.handle_disconnect(connection_id).await;
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Dispatch a parsed client message to the hub.
async fn handle_message(msg: ClientMessage, app: &App, connection_id: ConnectionId) {
    match msg {
        ClientMessage::Join { username, mode } => {
            app.hub.join(connection_id, username, mode).await;
        }
        ClientMessage::Move { column } => app.hub.apply_move(connection_id, column).await,
        ClientMessage::CancelWaiting => app.hub.cancel_waiting(connection_id).await,
        ClientMessage::PlayAgain => app.hub.request_rematch(connection_id).await,
        ClientMessage::ExitGame => app.hub.exit(connection_id).await,
    }
}
