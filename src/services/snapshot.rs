//! Snapshot service: opaque raster blobs stored per room.
//!
//! Snapshots are a rendering shortcut for very large histories. The blob is
//! never inspected or decoded here, and storing one does not touch the
//! room's operation log.

use std::time::Instant;

use crate::state::AppState;

/// Store a snapshot blob for a room. Silently dropped if the room does not
/// exist; snapshots are only accepted from joined clients.
pub fn save(state: &AppState, room: &str, blob: String) {
    let Some(mut entry) = state.rooms.get_mut(room) else {
        return;
    };
    entry.snapshots.push(blob);
    entry.last_activity = Instant::now();
}

/// The most recently stored snapshot for a room, if any.
pub fn latest(state: &AppState, room: &str) -> Option<String> {
    state.rooms.get(room)?.snapshots.last().cloned()
}
