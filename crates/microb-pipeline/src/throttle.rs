//! Shared pacing between workers.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Spaces item starts at least `interval` apart across all threads.
///
/// Behaves like a token bucket holding a single token: the first caller
/// proceeds immediately, later callers are handed consecutive slots and
/// sleep until theirs arrives. A zero interval never blocks.
pub(crate) struct Throttle {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Block until the caller may start its next item.
    pub fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }

        let now = Instant::now();
        let start = {
            let mut next = self
                .next_slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let start = next.map_or(now, |slot| slot.max(now));
            *next = Some(start + self.interval);
            start
        };

        let delay = start.saturating_duration_since(now);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
