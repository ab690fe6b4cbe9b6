// SPDX-License-Identifier: MIT

//! A counter with a threshold and a manual-reset `open` flag. `RecordSuccess`
//! deliberately does not clear `open` — once tripped, only an explicit
//! `reset` (typically an operator action) re-enables scheduling.

use parking_lot::Mutex;
use quorum_core::{Clock, SystemClock};

/// Snapshot for persistence (`GetState`/`SetState`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CircuitBreakerState {
    pub consecutive_failures: u32,
    pub open: bool,
    pub last_failure_at_epoch_ms: Option<u64>,
}

pub struct CircuitBreaker<C: Clock = SystemClock> {
    threshold: u32,
    state: Mutex<CircuitBreakerState>,
    clock: C,
}

impl CircuitBreaker<SystemClock> {
    pub fn new(threshold: u32) -> Self {
        Self::with_clock(threshold, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn with_clock(threshold: u32, clock: C) -> Self {
        Self { threshold: threshold.max(1), state: Mutex::new(CircuitBreakerState::default()), clock }
    }

    pub fn record_success(&self) {
        self.state.lock().consecutive_failures = 0;
    }

    /// Returns `true` exactly once per trip — the moment the threshold is
    /// crossed, not on every subsequent failure while already open.
    pub fn record_failure(&self) -> bool {
        let mut state = self.state.lock();
        state.consecutive_failures += 1;
        state.last_failure_at_epoch_ms = Some(self.clock.epoch_ms());
        if state.consecutive_failures >= self.threshold && !state.open {
            state.open = true;
            return true;
        }
        false
    }

    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.consecutive_failures = 0;
        state.open = false;
        state.last_failure_at_epoch_ms = None;
    }

    /// Force the breaker open, e.g. when restoring a persisted open state.
    pub fn open(&self) {
        self.state.lock().open = true;
    }

    pub fn set_state(&self, state: CircuitBreakerState) {
        *self.state.lock() = state;
    }

    pub fn get_state(&self) -> CircuitBreakerState {
        *self.state.lock()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.lock().consecutive_failures
    }

    pub fn last_failure_at(&self) -> Option<u64> {
        self.state.lock().last_failure_at_epoch_ms
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_core::FakeClock;

    #[test]
    fn trips_exactly_once_at_threshold() {
        let cb = CircuitBreaker::with_clock(2, FakeClock::new());
        assert!(!cb.record_failure());
        assert!(cb.record_failure());
        assert!(cb.is_open());
        // Already open: further failures report no new trip.
        assert!(!cb.record_failure());
    }

    #[test]
    fn success_does_not_clear_open() {
        let cb = CircuitBreaker::with_clock(1, FakeClock::new());
        assert!(cb.record_failure());
        cb.record_success();
        assert_eq!(cb.consecutive_failures(), 0);
        assert!(cb.is_open(), "manual-reset policy: success must not clear open");
    }

    #[test]
    fn reset_clears_everything() {
        let cb = CircuitBreaker::with_clock(1, FakeClock::new());
        cb.record_failure();
        cb.reset();
        assert!(!cb.is_open());
        assert_eq!(cb.consecutive_failures(), 0);
        assert_eq!(cb.last_failure_at(), None);
    }

    #[test]
    fn set_state_round_trips_through_get_state() {
        let cb = CircuitBreaker::with_clock(3, FakeClock::new());
        let state = CircuitBreakerState { consecutive_failures: 2, open: true, last_failure_at_epoch_ms: Some(42) };
        cb.set_state(state);
        assert_eq!(cb.get_state(), state);
    }

    #[test]
    fn last_failure_at_uses_the_clock() {
        let clock = FakeClock::new();
        let cb = CircuitBreaker::with_clock(5, clock.clone());
        clock.advance(std::time::Duration::from_secs(10));
        cb.record_failure();
        assert_eq!(cb.last_failure_at(), Some(clock.epoch_ms()));
    }
}
