//! Local mirror of a room's operation sequence with optimistic apply.
//!
//! DESIGN
//! ======
//! Every stroke is rendered the moment it happens and recorded as a
//! speculative mirror entry carrying only a freshly minted `clientId`. When
//! the server's confirming broadcast for that `clientId` arrives, the entry
//! is promoted in place to confirmed identity (`opId` + `userId`) without a
//! second render, so the same logical stroke is never stored or drawn twice.
//!
//! Undo/redo/clear broadcasts flip visibility flags and trigger a full
//! re-render from the mirror. Broadcasts naming an `opId` the mirror does not
//! hold are ignored; after a snapshot reset the server's log still carries
//! pre-snapshot identities, and acting on them here would desynchronize the
//! surface.

use std::collections::HashMap;

use uuid::Uuid;
use wire::{ClientMessage, DrawDraft, Operation, Point, ServerMessage, Tool};

use crate::surface::CanvasSurface;

// =============================================================================
// MIRROR RECORDS
// =============================================================================

/// Identity of a mirror entry over its lifecycle.
///
/// `Speculative` entries were applied locally and await the server's
/// confirming broadcast; `Confirmed` is terminal. An entry that never
/// confirms (lost message) stays speculative and visually present, but can
/// no longer be targeted by identity-based undo/redo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Speculative { client_id: String },
    Confirmed { op_id: u64, user_id: Uuid },
}

/// One stroke segment in the local mirror.
#[derive(Clone, Debug, PartialEq)]
pub struct MirrorOp {
    pub identity: Identity,
    pub prev_point: Point,
    pub point: Point,
    pub color: String,
    pub size: f64,
    pub tool: Tool,
    pub active: bool,
}

impl MirrorOp {
    fn confirmed_op_id(&self) -> Option<u64> {
        match self.identity {
            Identity::Confirmed { op_id, .. } => Some(op_id),
            Identity::Speculative { .. } => None,
        }
    }
}

/// A locally drawn stroke segment, before identity has been minted.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeDraft {
    pub prev_point: Point,
    pub point: Point,
    pub color: String,
    pub size: f64,
    pub tool: Tool,
}

/// A peer cursor as last broadcast. Purely presentational; the UI layer
/// reads this table and draws the overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteCursor {
    pub x: f64,
    pub y: f64,
    pub color: String,
}

// =============================================================================
// RECONCILER
// =============================================================================

/// Participant-side state machine: local mirror, rendered surface, and peer
/// cursor table.
pub struct Reconciler<S> {
    surface: S,
    mirror: Vec<MirrorOp>,
    cursors: HashMap<Uuid, RemoteCursor>,
}

impl<S: CanvasSurface> Reconciler<S> {
    pub fn new(surface: S) -> Self {
        Self { surface, mirror: Vec::new(), cursors: HashMap::new() }
    }

    /// Apply a local stroke optimistically.
    ///
    /// Renders immediately, records a speculative mirror entry, and returns
    /// the correlated draw message for the caller's transport to send.
    pub fn apply_local(&mut self, draft: StrokeDraft) -> ClientMessage {
        let client_id = Uuid::new_v4().to_string();

        self.surface
            .draw_segment(draft.prev_point, draft.point, &draft.color, draft.size, draft.tool);
        self.mirror.push(MirrorOp {
            identity: Identity::Speculative { client_id: client_id.clone() },
            prev_point: draft.prev_point,
            point: draft.point,
            color: draft.color.clone(),
            size: draft.size,
            tool: draft.tool,
            active: true,
        });

        ClientMessage::Draw(DrawDraft {
            prev_point: draft.prev_point,
            point: draft.point,
            color: draft.color,
            size: draft.size,
            tool: draft.tool,
            client_id,
        })
    }

    /// Apply a confirmed operation broadcast by the server.
    ///
    /// If it correlates to a speculative entry, that entry is promoted in
    /// place and nothing is re-rendered. Otherwise it is a genuinely remote
    /// stroke: appended to the mirror and rendered if active.
    pub fn apply_remote(&mut self, op: Operation) {
        if let Some(client_id) = &op.client_id {
            let promoted = self.mirror.iter_mut().find(|entry| {
                matches!(&entry.identity, Identity::Speculative { client_id: cid } if cid == client_id)
            });
            if let Some(entry) = promoted {
                entry.identity = Identity::Confirmed { op_id: op.op_id, user_id: op.user_id };
                return;
            }
        }

        let entry = MirrorOp {
            identity: Identity::Confirmed { op_id: op.op_id, user_id: op.user_id },
            prev_point: op.prev_point,
            point: op.point,
            color: op.color,
            size: op.size,
            tool: op.tool,
            active: op.active,
        };
        if entry.active {
            self.surface
                .draw_segment(entry.prev_point, entry.point, &entry.color, entry.size, entry.tool);
        }
        self.mirror.push(entry);
    }

    /// Replace the entire mirror with server history and re-render from
    /// scratch. Used on join and whenever the server resends bulk state.
    pub fn apply_history(&mut self, ops: Vec<Operation>) {
        self.mirror = ops
            .into_iter()
            .map(|op| MirrorOp {
                identity: Identity::Confirmed { op_id: op.op_id, user_id: op.user_id },
                prev_point: op.prev_point,
                point: op.point,
                color: op.color,
                size: op.size,
                tool: op.tool,
                active: op.active,
            })
            .collect();
        self.redraw();
    }

    /// Flip one operation inactive per an `undo-op` broadcast.
    pub fn apply_undo(&mut self, op_id: u64) {
        self.set_active(op_id, false);
    }

    /// Flip one operation active per a `redo-op` broadcast.
    pub fn apply_redo(&mut self, op_id: u64) {
        self.set_active(op_id, true);
    }

    /// Flip a set of operations inactive per a `clear-user-strokes`
    /// broadcast. Re-renders once, not per entry.
    pub fn apply_clear(&mut self, op_ids: &[u64]) {
        let mut changed = false;
        for entry in &mut self.mirror {
            if let Some(op_id) = entry.confirmed_op_id() {
                if op_ids.contains(&op_id) && entry.active {
                    entry.active = false;
                    changed = true;
                }
            }
        }
        if changed {
            self.redraw();
        }
    }

    /// Replace the surface with a snapshot blob and reset the mirror.
    ///
    /// Post-snapshot history starts fresh on this participant even though
    /// the server's log is not truncated; stale identities arriving later
    /// are absorbed by the unknown-`opId` handling above.
    pub fn apply_snapshot(&mut self, blob: &str) {
        self.surface.show_snapshot(blob);
        self.mirror.clear();
    }

    /// Record a peer cursor position.
    pub fn cursor(&mut self, id: Uuid, x: f64, y: f64, color: String) {
        self.cursors.insert(id, RemoteCursor { x, y, color });
    }

    /// Drop a disconnected peer's cursor.
    pub fn remove_cursor(&mut self, id: Uuid) {
        self.cursors.remove(&id);
    }

    /// Dispatch one inbound server message.
    pub fn apply_server(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::CanvasHistory { ops } => self.apply_history(ops),
            ServerMessage::Draw(op) => self.apply_remote(op),
            ServerMessage::UndoOp { op_id } => self.apply_undo(op_id),
            ServerMessage::RedoOp { op_id } => self.apply_redo(op_id),
            ServerMessage::ClearUserStrokes { ops } => self.apply_clear(&ops),
            ServerMessage::Cursor { id, x, y, color } => self.cursor(id, x, y, color),
            ServerMessage::Snapshot { snapshot } | ServerMessage::SetSnapshot { snapshot } => {
                self.apply_snapshot(&snapshot);
            }
            ServerMessage::RemoveCursor { id } => self.remove_cursor(id),
        }
    }

    /// The local mirror in append order, speculative entries included.
    #[must_use]
    pub fn mirror(&self) -> &[MirrorOp] {
        &self.mirror
    }

    /// Peer cursors keyed by connection identity.
    #[must_use]
    pub fn cursors(&self) -> &HashMap<Uuid, RemoteCursor> {
        &self.cursors
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn set_active(&mut self, op_id: u64, active: bool) {
        let entry = self
            .mirror
            .iter_mut()
            .find(|entry| entry.confirmed_op_id() == Some(op_id));
        // Unknown opId: either a stale pre-snapshot identity or a stroke this
        // participant never saw. Ignore rather than desynchronize.
        let Some(entry) = entry else { return };
        if entry.active != active {
            entry.active = active;
            self.redraw();
        }
    }

    fn redraw(&mut self) {
        self.surface.clear();
        for entry in &self.mirror {
            if entry.active {
                self.surface
                    .draw_segment(entry.prev_point, entry.point, &entry.color, entry.size, entry.tool);
            }
        }
    }
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
