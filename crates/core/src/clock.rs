// SPDX-License-Identifier: MIT

//! Clock abstraction for testable time handling.
//!
//! Every timestamp in the system — agent event IDs, chat message
//! timestamps, circuit breaker `LastFailureAt`, the notifier's debounce
//! bookkeeping — goes through this trait instead of calling
//! `SystemTime::now()` directly, so tests can advance time deterministically.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;

    /// RFC3339Nano-formatted UTC timestamp for the current instant.
    fn rfc3339(&self) -> String {
        format_epoch_ms_rfc3339(self.epoch_ms())
    }
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
    epoch_ms: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { current: Arc::new(Mutex::new(Instant::now())), epoch_ms: Arc::new(AtomicU64::new(1_700_000_000_000)) }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
        self.epoch_ms.fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_epoch_ms(&self, ms: u64) {
        self.epoch_ms.store(ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_ms.load(Ordering::SeqCst)
    }
}

/// Formats milliseconds-since-epoch as UTC RFC3339Nano (e.g.
/// `2026-08-01T12:00:00.000000000Z`), the canonical timestamp encoding for
/// everything this system persists.
pub fn format_epoch_ms_rfc3339(epoch_ms: u64) -> String {
    let secs = (epoch_ms / 1000) as i64;
    let nanos = ((epoch_ms % 1000) * 1_000_000) as u32;
    chrono::DateTime::<chrono::Utc>::from_timestamp(secs, nanos).unwrap_or_default().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}

/// Parses an RFC3339 timestamp back to milliseconds-since-epoch. Returns
/// `None` for anything that isn't a valid RFC3339 string.
pub fn parse_rfc3339_to_epoch_ms(s: &str) -> Option<u64> {
    let dt = chrono::DateTime::parse_from_rfc3339(s).ok()?;
    u64::try_from(dt.timestamp_millis()).ok()
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
