//! Room reaper: background eviction of idle rooms.
//!
//! DESIGN
//! ======
//! The operation log for a room lives in memory for as long as the room
//! does. A background task sweeps the room map on an interval and asks the
//! configured [`EvictionPolicy`] whether each room may be dropped. The
//! default policy only evicts rooms with no connected clients that have
//! been idle past a threshold, so an evicted room can never strand a live
//! connection.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::state::AppState;

const DEFAULT_ROOM_IDLE_SECS: u64 = 900;
const DEFAULT_REAPER_SWEEP_SECS: u64 = 60;

// =============================================================================
// POLICY
// =============================================================================

/// Decides whether a room may be dropped from memory.
///
/// Dropping a room discards its operation log and snapshots; clients that
/// join it later start from an empty history.
pub trait EvictionPolicy: Send + Sync {
    fn should_evict(&self, members: usize, idle: Duration) -> bool;
}

/// Evict rooms that have had no connected clients for `max_idle`.
pub struct IdleTimeout {
    pub max_idle: Duration,
}

impl EvictionPolicy for IdleTimeout {
    fn should_evict(&self, members: usize, idle: Duration) -> bool {
        members == 0 && idle >= self.max_idle
    }
}

/// Keep every room forever. Used in tests and for setups where history
/// must survive arbitrary idle gaps.
pub struct NeverEvict;

impl EvictionPolicy for NeverEvict {
    fn should_evict(&self, _members: usize, _idle: Duration) -> bool {
        false
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Reaper tuning, loaded from environment variables.
#[derive(Clone, Copy)]
pub struct ReaperConfig {
    /// How long an empty room may sit idle before eviction.
    pub room_idle: Duration,
    /// Interval between sweeps of the room map.
    pub sweep_interval: Duration,
}

impl ReaperConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            room_idle: Duration::from_secs(env_parse("ROOM_IDLE_SECS", DEFAULT_ROOM_IDLE_SECS)),
            sweep_interval: Duration::from_secs(env_parse(
                "REAPER_SWEEP_SECS",
                DEFAULT_REAPER_SWEEP_SECS,
            )),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// SWEEP
// =============================================================================

/// Spawn the background reaper task. Returns a handle for shutdown.
pub fn spawn_reaper_task(state: AppState, sweep_interval: Duration) -> JoinHandle<()> {
    info!(sweep_secs = sweep_interval.as_secs(), "room reaper configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            sweep(&state);
        }
    })
}

/// Run one sweep over the room map, returning how many rooms were evicted.
pub(crate) fn sweep(state: &AppState) -> usize {
    let now = Instant::now();
    let mut evicted = 0;
    state.rooms.retain(|room, room_state| {
        let idle = now.duration_since(room_state.last_activity);
        if state.eviction.should_evict(room_state.clients.len(), idle) {
            info!(room, ops = room_state.ops.len(), "evicted idle room");
            evicted += 1;
            false
        } else {
            true
        }
    });
    evicted
}
