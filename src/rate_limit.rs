//! Per-client fixed-window admission control.
//!
//! Every client identity (normally its IP address) owns one [`ClientWindow`]
//! holding a request count and the instant the window was last anchored.
//! Windows live in a [`DashMap`], so all work on one identity happens under
//! that identity's shard lock and the read-then-write steps below can't
//! interleave with another caller.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};

/// How `record` anchors the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    /// Every recorded request moves the window start to "now", so expiry is
    /// measured from the most recent request. A client that keeps sending
    /// stays limited until it goes quiet for a full window.
    #[default]
    Refreshing,
    /// The window start is set once when the window opens and the count
    /// rolls over a full window later, however busy the client is.
    Fixed,
}

// Rate limit entry - tracks requests per IP/key
#[derive(Debug, Clone, Copy)]
pub struct ClientWindow {
    pub count: u32,
    pub window_start: Instant,
}

pub struct RateLimiter {
    windows: DashMap<String, ClientWindow>,
    max_requests: u32,
    window: Duration,
    mode: WindowMode,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
            mode: WindowMode::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_mode(mut self, mode: WindowMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    /// Decide whether `identity` may send another request.
    ///
    /// Never counts anything. The only write is zeroing the count of a window
    /// that has already expired.
    pub fn admit(&self, identity: &str) -> bool {
        // first request ever is always let through
        let Some(mut entry) = self.windows.get_mut(identity) else {
            return true;
        };
        let now = self.clock.now();
        self.admit_window(&mut entry, now)
    }

    /// Count one request for `identity`, opening or rolling its window as needed.
    pub fn record(&self, identity: &str) {
        let now = self.clock.now();
        let mut entry = self
            .windows
            .entry(identity.to_string())
            .or_insert(ClientWindow {
                count: 0,
                window_start: now,
            });
        self.record_window(&mut entry, now);
        trace!(identity, count = entry.count, "Recorded request");
    }

    /// `admit` then, when admitted, `record`, with no gap between the two in
    /// which another request from the same identity could slip through.
    pub fn check_and_record(&self, identity: &str) -> bool {
        let now = self.clock.now();
        let mut entry = self
            .windows
            .entry(identity.to_string())
            .or_insert(ClientWindow {
                count: 0,
                window_start: now,
            });

        if !self.admit_window(&mut entry, now) {
            debug!(identity, count = entry.count, "Rate limit exceeded");
            return false;
        }
        self.record_window(&mut entry, now);
        true
    }

    /// Drop every window that has already expired. Returns how many went.
    ///
    /// An expired window behaves exactly like a missing one for both
    /// `admit` and `record`, so this only frees memory.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.windows.retain(|_, w| {
            let keep = !self.expired(w.window_start, now);
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            debug!(removed, remaining = self.windows.len(), "Swept expired windows");
        }
        removed
    }

    // Requests counted in the identity's current window, if it has one
    pub fn count(&self, identity: &str) -> Option<u32> {
        self.windows.get(identity).map(|w| w.count)
    }

    // Number of identities currently tracked
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    fn expired(&self, window_start: Instant, now: Instant) -> bool {
        now.saturating_duration_since(window_start) >= self.window
    }

    fn admit_window(&self, w: &mut ClientWindow, now: Instant) -> bool {
        // window expired..? zero the count, start stays until the next record
        if self.expired(w.window_start, now) {
            w.count = 0;
            return true;
        }
        w.count < self.max_requests
    }

    fn record_window(&self, w: &mut ClientWindow, now: Instant) {
        if self.expired(w.window_start, now) {
            w.count = 0;
            w.window_start = now;
        }
        w.count = w.count.saturating_add(1);
        if self.mode == WindowMode::Refreshing {
            w.window_start = now;
        }
    }
}
