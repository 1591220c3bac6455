//! Room service: membership, history replay, and fan-out.
//!
//! DESIGN
//! ======
//! A room is created lazily on first join and lives until the reaper drops
//! it. Membership operations take the room's map entry, mutate, and release
//! before any I/O happens; fan-out clones messages into per-connection
//! bounded channels with `try_send`, so one slow client never stalls the
//! rest of the room.

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;
use wire::{Operation, ServerMessage};

use crate::state::{AppState, RoomState};

/// Join a room, creating it if absent. Returns the full operation history,
/// active and inactive entries alike, for replay on the joining client.
pub fn join_room(
    state: &AppState,
    room: &str,
    user_id: Uuid,
    tx: mpsc::Sender<ServerMessage>,
) -> Vec<Operation> {
    let mut entry = state.rooms.entry(room.to_owned()).or_default();
    entry.clients.insert(user_id, tx);
    entry.last_activity = Instant::now();
    info!(room, %user_id, clients = entry.clients.len(), "client joined room");
    entry.ops.clone()
}

/// Leave a room. The operation log stays behind for the reaper to judge.
pub fn leave_room(state: &AppState, room: &str, user_id: Uuid) {
    let Some(mut entry) = state.rooms.get_mut(room) else {
        return;
    };
    entry.clients.remove(&user_id);
    entry.last_activity = Instant::now();
    info!(room, %user_id, remaining = entry.clients.len(), "client left room");
}

/// Broadcast a message to all clients in a room, optionally excluding one.
///
/// Looks the room up first; callers that already hold the room's entry use
/// [`fan_out`] directly so the delivery happens under the same guard as the
/// mutation it announces.
pub fn broadcast(state: &AppState, room: &str, msg: &ServerMessage, exclude: Option<Uuid>) {
    let Some(entry) = state.rooms.get(room) else {
        return;
    };
    fan_out(&entry, msg, exclude);
}

/// Deliver a message to every member of an already-resolved room.
///
/// `try_send` never awaits, so this is safe to call while the room's map
/// entry guard is held. That is the point: fanning out under the guard is
/// what keeps broadcast order equal to `opId` order when senders run in
/// parallel.
pub fn fan_out(entry: &RoomState, msg: &ServerMessage, exclude: Option<Uuid>) {
    for (user_id, tx) in &entry.clients {
        if exclude == Some(*user_id) {
            continue;
        }
        // Best-effort: if a client's channel is full, skip it.
        let _ = tx.try_send(msg.clone());
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
