//! Stroke service: the authoritative operation log and its visibility flips.
//!
//! DESIGN
//! ======
//! Every accepted draw is appended to the room's log with `opId` equal to
//! the log length at acceptance, so ids are strictly increasing and double
//! as indices. Undo, redo, and clear never remove entries; they flip the
//! `active` flag and report which ids changed.
//!
//! Each mutation fans its announcement out to every room member, the sender
//! included, while the room's map entry guard is still held. Acceptance
//! order, `opId` assignment, and per-member delivery order therefore agree
//! even when senders run on different runtime threads; the fan-out is
//! `try_send`-only, so nothing awaits under the guard.
//!
//! Undo scans backward for the sender's newest active operation; redo scans
//! forward for the sender's oldest inactive one. The two are intentionally
//! not symmetric: a run of undos followed by a run of redos restores
//! operations oldest-first, which is the established behavior clients
//! depend on.

use std::time::Instant;

use uuid::Uuid;
use wire::{DrawDraft, Operation, ServerMessage};

use crate::services::room;
use crate::state::AppState;

/// Append a stroke to the room's log, announce it to the whole room, and
/// return the confirmed operation.
///
/// Returns `None` if the room does not exist; the caller guarantees a join
/// happened first, so a miss means the room has been evicted underneath a
/// stale connection.
pub fn append_draw(
    state: &AppState,
    room: &str,
    user_id: Uuid,
    draft: DrawDraft,
) -> Option<Operation> {
    let mut entry = state.rooms.get_mut(room)?;
    let op = Operation {
        room: room.to_owned(),
        op_id: entry.ops.len() as u64,
        client_id: Some(draft.client_id),
        user_id,
        prev_point: draft.prev_point,
        point: draft.point,
        color: draft.color,
        size: draft.size,
        tool: draft.tool,
        active: true,
    };
    entry.ops.push(op.clone());
    entry.last_activity = Instant::now();
    room::fan_out(&entry, &ServerMessage::Draw(op.clone()), None);
    Some(op)
}

/// Flip the sender's most recent active operation inactive and announce the
/// flip. Returns the affected `opId`, or `None` when the sender has nothing
/// left to undo (no announcement either).
pub fn undo(state: &AppState, room: &str, user_id: Uuid) -> Option<u64> {
    let mut entry = state.rooms.get_mut(room)?;
    entry.last_activity = Instant::now();
    let op = entry
        .ops
        .iter_mut()
        .rev()
        .find(|op| op.user_id == user_id && op.active)?;
    op.active = false;
    let op_id = op.op_id;
    room::fan_out(&entry, &ServerMessage::UndoOp { op_id }, None);
    Some(op_id)
}

/// Flip the sender's oldest inactive operation active and announce the
/// flip. Returns the affected `opId`, or `None` when the sender has nothing
/// to redo.
pub fn redo(state: &AppState, room: &str, user_id: Uuid) -> Option<u64> {
    let mut entry = state.rooms.get_mut(room)?;
    entry.last_activity = Instant::now();
    let op = entry
        .ops
        .iter_mut()
        .find(|op| op.user_id == user_id && !op.active)?;
    op.active = true;
    let op_id = op.op_id;
    room::fan_out(&entry, &ServerMessage::RedoOp { op_id }, None);
    Some(op_id)
}

/// Flip all of the sender's active operations inactive and return their ids
/// in log order. The set is broadcast even when empty, so every client
/// observes the clear attempt at the same point in the message order.
pub fn clear_user(state: &AppState, room: &str, user_id: Uuid) -> Vec<u64> {
    let Some(mut entry) = state.rooms.get_mut(room) else {
        return Vec::new();
    };
    entry.last_activity = Instant::now();
    let mut flipped = Vec::new();
    for op in &mut entry.ops {
        if op.user_id == user_id && op.active {
            op.active = false;
            flipped.push(op.op_id);
        }
    }
    room::fan_out(&entry, &ServerMessage::ClearUserStrokes { ops: flipped.clone() }, None);
    flipped
}

#[cfg(test)]
#[path = "strokes_test.rs"]
mod tests;
