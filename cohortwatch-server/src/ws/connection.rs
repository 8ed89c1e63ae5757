//! Viewer WebSocket connection handling

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::AppState;

use super::protocol::ServerMessage;

/// WebSocket upgrade handler
pub async fn viewer_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Serve one viewer until either side goes away
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let viewer_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();

    // Join before sending anything so no announcement falls in between.
    let (greeting, mut events_rx) = state.broadcaster.join();
    info!(%viewer_id, viewers = state.broadcaster.viewer_count(), "Viewer connected");

    for msg in &greeting {
        if send_json(&mut sender, msg).await.is_err() {
            debug!(%viewer_id, "Viewer left during greeting");
            return;
        }
    }

    loop {
        tokio::select! {
            result = events_rx.recv() => match result {
                Ok(msg) => {
                    if send_json(&mut sender, &msg).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(count)) => {
                    warn!(%viewer_id, skipped = count, "Viewer lagged, messages dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    debug!(%viewer_id, "Viewer sent close frame");
                    break;
                }
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(_)) => {
                    // Viewers have nothing to say; ignore text, binary and pong.
                }
                Some(Err(e)) => {
                    error!(%viewer_id, "WebSocket error: {}", e);
                    break;
                }
            },
        }
    }

    // Dropping the receiver removes the viewer from the broadcast group.
    drop(events_rx);
    info!(%viewer_id, "Viewer disconnected");
}

async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize viewer message: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await
}
