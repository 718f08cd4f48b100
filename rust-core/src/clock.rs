//! Time sources for stamping live readings.
//!
//! The engine itself only ever looks at frame timestamps. A [`Clock`] is
//! used by callers that receive readings without a device timestamp.

use std::cell::Cell;
use std::time::Instant;

/// Millisecond time source. Must never go backwards.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall-independent clock counting from its creation.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self { now: Cell::new(start_ms) }
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }

    /// Move to `ms`. Earlier times are ignored.
    pub fn set(&self, ms: u64) {
        if ms > self.now.get() {
            self.now.set(ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_ms(), 100);
        clock.advance(18);
        assert_eq!(clock.now_ms(), 118);
        clock.set(50);
        assert_eq!(clock.now_ms(), 118, "manual clock never goes backwards");
        clock.set(200);
        assert_eq!(clock.now_ms(), 200);
    }

    #[test]
    fn test_monotonic_clock_does_not_decrease() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
