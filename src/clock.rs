use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// Time source for the rate limiter
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

// Real monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Clock that only moves when told to.
///
/// Starts at the instant it was created and advances by whatever is passed
/// to [`ManualClock::advance`]. Handy for exercising window rollover without
/// sleeping.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + *offset
    }
}
