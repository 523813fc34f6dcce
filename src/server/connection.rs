//! Viewer websocket connections
//!
//! Each upgraded socket gets its own task that drains the viewer's queue into
//! the socket and watches the inbound half for close and ping frames.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{SinkExt, StreamExt};

use crate::hub::{BroadcastFrame, Hub, Viewer};
use crate::stats::{ReplayMetrics, ReplayStats};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub metrics: Arc<ReplayMetrics>,
}

/// Handle a viewer's websocket upgrade
///
/// The viewer is registered before the upgrade completes so that a full hub
/// can refuse it with `503`.
pub async fn handle_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let viewer = match state.hub.connect().await {
        Ok(viewer) => viewer,
        Err(e) => return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    };

    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| run_viewer(socket, hub, viewer))
}

/// Liveness check
pub async fn health() -> &'static str {
    "OK"
}

/// Replay counters snapshot
pub async fn stats(State(state): State<AppState>) -> Json<ReplayStats> {
    let viewers = state.hub.viewer_count().await;
    Json(state.metrics.snapshot(viewers))
}

async fn run_viewer(socket: WebSocket, hub: Arc<Hub>, mut viewer: Viewer) {
    let id = viewer.id();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            frame = viewer.recv() => {
                let Some(frame) = frame else {
                    // Reaped by the hub or shutting down
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };

                let Some(message) = text_message(&frame) else {
                    tracing::debug!(viewer = %id, sequence = frame.sequence, "Frame is not UTF-8");
                    continue;
                };

                if let Err(e) = sender.send(message).await {
                    tracing::debug!(viewer = %id, error = %e, "Send failed");
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(viewer = %id, "Viewer closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(viewer = %id, error = %e, "Receive failed");
                        break;
                    }
                    // Viewers have nothing to say
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    hub.disconnect(id).await;
}

/// Wrap a frame as a text message sharing the frame's allocation
fn text_message(frame: &BroadcastFrame) -> Option<Message> {
    Utf8Bytes::try_from(frame.payload.clone())
        .ok()
        .map(Message::Text)
}
