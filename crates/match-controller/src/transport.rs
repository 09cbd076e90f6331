//! WebSocket ingress.
//!
//! One task per connection. The first text frame must be the client's
//! profile JSON; it creates the `Client` and hands it to the matchmaker.
//! Later inbound frames are ignored - a client is enqueued exactly once per
//! connection and never reused across pairings. The task then drains the
//! client's outbound channel onto the socket until either side goes away.
//!
//! The connection closes once the outcome has been delivered: when the
//! matchmaker drops its last handle clone the outbound channel ends, and the
//! task exits after flushing any queued message.

use crate::actors::MatchmakerHandle;
use crate::connection::{Client, ClientProfile, ConnectionHandle, OutcomeMessage};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared state for the WebSocket router.
pub struct AppState {
    /// Handle to the matchmaker actor.
    pub matchmaker: MatchmakerHandle,
}

/// Create the matchmaking router with the `/ws` upgrade endpoint.
pub fn ws_router(state: Arc<AppState>) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// Drive one client connection from announcement to close.
async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();

    // First frame: the client profile.
    let Some(profile) = read_profile(&mut stream).await else {
        return;
    };

    let (handle, mut outbound) = ConnectionHandle::new();
    let client = Client::new(profile, handle);
    let client_id = client.id;

    info!(
        target: "mm.transport",
        client_id = %client_id,
        name = %client.profile.name,
        "Client joined matchmaking"
    );

    if let Err(e) = state.matchmaker.client_arrived(client).await {
        warn!(
            target: "mm.transport",
            client_id = %client_id,
            error = %e,
            "Arrival rejected"
        );
        send_json(&mut sink, &OutcomeMessage::failed()).await;
        return;
    }

    loop {
        tokio::select! {
            queued = outbound.recv() => {
                match queued {
                    Some(message) => {
                        if !send_json(&mut sink, &message).await {
                            break;
                        }
                    }
                    // All handle clones dropped: the pairing attempt has
                    // concluded and its outcome (if any) is already flushed.
                    None => break,
                }
            }

            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(_))) => {
                        debug!(
                            target: "mm.transport",
                            client_id = %client_id,
                            "Ignoring extra frame from already-enqueued client"
                        );
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    if state.matchmaker.client_disconnected(client_id).await.is_err() {
        debug!(
            target: "mm.transport",
            client_id = %client_id,
            "Matchmaker gone before disconnect notification"
        );
    }

    debug!(target: "mm.transport", client_id = %client_id, "Connection closed");
}

/// Wait for the announcement frame and parse the profile.
///
/// Returns `None` if the connection closes first or the frame is not a valid
/// profile; a malformed announcement drops the connection.
async fn read_profile(
    stream: &mut (impl Stream<Item = Result<Message, axum::Error>> + Unpin),
) -> Option<ClientProfile> {
    loop {
        match stream.next().await? {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientProfile>(&text) {
                Ok(profile) => return Some(profile),
                Err(e) => {
                    warn!(target: "mm.transport", error = %e, "Malformed client profile");
                    return None;
                }
            },
            Ok(Message::Close(_)) | Err(_) => return None,
            // Pings are answered by axum; anything else is ignored until the
            // profile arrives.
            Ok(_) => {}
        }
    }
}

/// Serialize and send one message; returns false once the socket is gone.
async fn send_json(sink: &mut (impl Sink<Message> + Unpin), message: &OutcomeMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(text) => sink.send(Message::Text(text)).await.is_ok(),
        Err(e) => {
            warn!(target: "mm.transport", error = %e, "Outcome serialization failed");
            false
        }
    }
}
