//! Timestamp utilities and the injectable clock used for cache TTL decisions

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Monotonic clock abstraction.
///
/// Cache entries record the instant they were fetched; staleness is decided
/// by comparing against the clock's current instant. Injecting the clock lets
/// tests drive TTL expiry without real waiting.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by `Instant::now()`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Instant::now()),
        }
    }

    /// Advance the clock by `delta`
    pub fn advance(&self, delta: Duration) {
        let mut current = self.current.lock().expect("clock lock poisoned");
        *current += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock().expect("clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::from_millis(0));
        assert_eq!(millis_to_duration(100), Duration::from_millis(100));
        assert_eq!(millis_to_duration(1000), Duration::from_secs(1));
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn test_manual_clock_holds_still() {
        let clock = ManualClock::new();
        let first = clock.now();
        let second = clock.now();
        assert_eq!(first, second);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_secs(300));
        assert_eq!(clock.now().duration_since(start), Duration::from_secs(300));
    }
}
