use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Time source for timers. `now()` is measured from an arbitrary epoch
/// fixed when the clock was created and never goes backwards.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Duration;
}

/// Monotonic clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SteadyClock {
    origin: Instant,
}

impl SteadyClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SteadyClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SteadyClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Used to drive timers deterministically.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ns: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `step`
    pub fn advance(&self, step: Duration) {
        self.now_ns
            .fetch_add(step.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute time. Earlier values are ignored.
    pub fn set(&self, now: Duration) {
        self.now_ns
            .fetch_max(now.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.now_ns.load(Ordering::SeqCst))
    }
}
