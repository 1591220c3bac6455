//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the live room map: each room has its own operation log, connected
//! clients, and snapshot list. Rooms are sharded behind a `DashMap`, so
//! touching one room never contends with traffic in another. All room
//! mutation happens synchronously while an entry guard is held; nothing
//! awaits under a room lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;
use wire::{Operation, ServerMessage};

use crate::reaper::EvictionPolicy;

// =============================================================================
// ROOM STATE
// =============================================================================

/// Per-room live state.
///
/// `ops` is append-only: undo/redo/clear flip `active` flags, entries are
/// never removed, so `opId` equals the index at append time for the life of
/// the room.
pub struct RoomState {
    /// The authoritative operation log, in acceptance order.
    pub ops: Vec<Operation>,
    /// Connected clients: connection id -> sender for outgoing messages.
    pub clients: HashMap<Uuid, mpsc::Sender<ServerMessage>>,
    /// Stored raster snapshots, oldest first.
    pub snapshots: Vec<String>,
    /// Last join/leave/draw activity, read by the room reaper.
    pub last_activity: Instant,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            clients: HashMap::new(),
            snapshots: Vec::new(),
            last_activity: Instant::now(),
        }
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<DashMap<String, RoomState>>,
    /// Decides when the reaper may drop an idle room.
    pub eviction: Arc<dyn EvictionPolicy>,
}

impl AppState {
    #[must_use]
    pub fn new(eviction: Arc<dyn EvictionPolicy>) -> Self {
        Self { rooms: Arc::new(DashMap::new()), eviction }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
