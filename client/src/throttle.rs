//! Outbound event throttle for high-frequency pointer streams.

use std::time::{Duration, Instant};

/// Default minimum spacing between cursor messages, roughly one per frame
/// at 60 Hz.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(16);

/// Gate that admits at most one event per interval.
///
/// The first event is always admitted; subsequent events are dropped until
/// the interval has elapsed since the last admitted one. Dropped events are
/// gone, not queued, which is the right trade for ephemeral cursor data.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Whether an event occurring now should be sent.
    pub fn admit(&mut self) -> bool {
        self.admit_at(Instant::now())
    }

    // Separated from admit() so tests can drive time explicitly.
    fn admit_at(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}
