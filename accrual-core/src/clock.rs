use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Time source of a failure detector, returning the current time in milliseconds.
///
/// It is only used for measuring intervals, so the epoch is irrelevant but the
/// values must not go backwards in production.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

impl<F> Clock for F where F: Fn() -> u64 + Send + Sync {
    fn now_millis(&self) -> u64 {
        self()
    }
}

/// Milliseconds elapsed since the clock was created.
#[derive(Debug, Copy, Clone)]
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
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// A clock that only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self { now: AtomicU64::new(start) }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::Release);
    }

    /// Moves the clock forward and returns the new time.
    pub fn advance(&self, millis: u64) -> u64 {
        self.now.fetch_add(millis, Ordering::AcqRel) + millis
    }
}

impl Debug for ManualClock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.now.load(Ordering::Acquire))
            .finish()
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}
