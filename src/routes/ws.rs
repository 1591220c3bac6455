//! WebSocket handler: the room coordinator.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection id and enters a `select!` loop:
//! - Incoming client messages → decode + dispatch by message type
//! - Broadcast messages from room peers → forward to client
//!
//! Handler logic is synchronous: it decodes and mutates room state through
//! the services. Log mutations (draw, undo, redo, clear) fan their
//! announcement out inside the service, to every member's channel including
//! the sender's, while the room's map entry guard is still held; that guard
//! is the per-room serialization point that makes acceptance order, `opId`
//! assignment, and each member's delivery order agree. The dispatch layer
//! only sends direct replies (history replay, snapshot fetch) and the
//! ephemeral cursor fan-out, none of which carry ordering guarantees.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → connection id minted, doubles as the user id
//! 2. Client sends `join` → membership + full history replay to sender
//! 3. draw/undo/redo/clear/cursor/snapshot messages dispatch per type
//! 4. Close → broadcast `remove-cursor` to peers → membership cleanup

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wire::{ClientMessage, ServerMessage};

use crate::services;
use crate::state::AppState;

/// Per-connection broadcast queue depth. Slow consumers past this lose
/// messages rather than stall the room.
const CLIENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result of handling one inbound message. The dispatch layer uses this to
/// decide who receives what; handlers never touch the socket directly.
///
/// Log mutations do not appear here: their announcements are delivered by
/// the stroke service under the room guard, and the sender's copy arrives
/// through its own broadcast channel like everyone else's.
enum Outcome {
    /// Send to sender only. Used for history replay and snapshot fetches.
    Reply(ServerMessage),
    /// Fan out to room peers only, nothing back to the sender.
    /// Used for cursor moves (the sender already knows where its cursor is).
    BroadcastExcludeSender(ServerMessage),
    /// No output from the dispatch layer.
    Silent,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    // The connection id doubles as the user id for stroke ownership.
    let user_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcast messages from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(CLIENT_CHANNEL_CAPACITY);

    info!(%user_id, "ws: client connected");

    let mut current_room: Option<String> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies =
                            process_inbound_text(&state, &mut current_room, user_id, &client_tx, &text);
                        let mut failed = false;
                        for reply in replies {
                            if send_message(&mut socket, &reply).await.is_err() {
                                failed = true;
                                break;
                            }
                        }
                        if failed {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(msg) = client_rx.recv() => {
                if send_message(&mut socket, &msg).await.is_err() {
                    break;
                }
            }
        }
    }

    // Tell peers to drop this cursor BEFORE membership cleanup.
    if let Some(room) = current_room {
        services::room::broadcast(
            &state,
            &room,
            &ServerMessage::RemoveCursor { id: user_id },
            Some(user_id),
        );
        services::room::leave_room(&state, &room, user_id);
    }
    info!(%user_id, "ws: client disconnected");
}

// =============================================================================
// MESSAGE DISPATCH
// =============================================================================

/// Decode and process one inbound text frame, returning messages for the
/// sender. Peer fan-out happens inside; keeping this free of socket I/O
/// lets tests drive the whole dispatch path with plain channels.
fn process_inbound_text(
    state: &AppState,
    current_room: &mut Option<String>,
    user_id: Uuid,
    client_tx: &mpsc::Sender<ServerMessage>,
    text: &str,
) -> Vec<ServerMessage> {
    let msg = match wire::decode_client(text) {
        Ok(msg) => msg,
        Err(e) => {
            // Malformed frames are dropped without an error reply; a draw
            // with missing or non-numeric coordinates lands here too.
            warn!(%user_id, error = %e, "ws: invalid inbound message");
            return vec![];
        }
    };

    let outcome = match msg {
        ClientMessage::Join { room } => {
            // Switching rooms is leave-then-join. Messages arriving in the
            // gap are dropped by the no-room check below, not queued.
            if let Some(old_room) = current_room.take() {
                services::room::leave_room(state, &old_room, user_id);
            }
            let ops = services::room::join_room(state, &room, user_id, client_tx.clone());
            *current_room = Some(room);
            Outcome::Reply(ServerMessage::CanvasHistory { ops })
        }
        other => {
            let Some(room) = current_room.as_deref() else {
                debug!(%user_id, "ws: message before join dropped");
                return vec![];
            };
            handle_in_room(state, room, user_id, other)
        }
    };

    match outcome {
        Outcome::Reply(msg) => vec![msg],
        Outcome::BroadcastExcludeSender(msg) => {
            if let Some(room) = current_room.as_deref() {
                services::room::broadcast(state, room, &msg, Some(user_id));
            }
            vec![]
        }
        Outcome::Silent => vec![],
    }
}

/// Handle a message from a client that has already joined `room`.
fn handle_in_room(state: &AppState, room: &str, user_id: Uuid, msg: ClientMessage) -> Outcome {
    match msg {
        // Handled before room resolution.
        ClientMessage::Join { .. } => Outcome::Silent,

        ClientMessage::Draw(draft) => {
            if services::strokes::append_draw(state, room, user_id, draft).is_none() {
                debug!(%user_id, room, "ws: draw for evicted room dropped");
            }
            Outcome::Silent
        }
        ClientMessage::Undo => {
            let _ = services::strokes::undo(state, room, user_id);
            Outcome::Silent
        }
        ClientMessage::Redo => {
            let _ = services::strokes::redo(state, room, user_id);
            Outcome::Silent
        }
        ClientMessage::Clear => {
            services::strokes::clear_user(state, room, user_id);
            Outcome::Silent
        }
        ClientMessage::Cursor { x, y, color } => {
            Outcome::BroadcastExcludeSender(ServerMessage::Cursor { id: user_id, x, y, color })
        }
        ClientMessage::SaveSnapshot { snapshot } => {
            services::snapshot::save(state, room, snapshot);
            Outcome::Silent
        }
        ClientMessage::RequestLatest => match services::snapshot::latest(state, room) {
            Some(snapshot) => Outcome::Reply(ServerMessage::Snapshot { snapshot }),
            None => Outcome::Silent,
        },
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), ()> {
    let is_cursor = matches!(msg, ServerMessage::Cursor { .. } | ServerMessage::RemoveCursor { .. });
    if !is_cursor {
        debug!(?msg, "ws: send message");
    }
    let json = wire::encode_server(msg);
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
