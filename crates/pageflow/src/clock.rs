//! Clocks for wait polling.
//!
//! The waiter never calls `Instant::now` or `thread::sleep` directly; it goes
//! through a [`Clock`], so tests can substitute a [`FakeClock`] whose sleeps
//! advance virtual time instantly and deterministically.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of monotonic time for the wait engine
pub trait Clock: Send + Sync + Debug {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock for deterministic tests.
///
/// `sleep` returns immediately after moving the clock forward, so a five
/// second timeout costs nothing in wall time.
#[derive(Debug, Default)]
pub struct FakeClock {
    current_ms: AtomicU64,
}

impl FakeClock {
    /// Create a fake clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fake clock at a given time
    #[must_use]
    pub fn at(time_ms: u64) -> Self {
        Self {
            current_ms: AtomicU64::new(time_ms),
        }
    }

    /// Move time forward
    pub fn advance(&self, duration: Duration) {
        let _ = self
            .current_ms
            .fetch_add(duration_to_ms(duration), Ordering::SeqCst);
    }

    /// Set the absolute time
    pub fn set(&self, time_ms: u64) {
        self.current_ms.store(time_ms, Ordering::SeqCst);
    }

    /// Current time in milliseconds
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms())
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
