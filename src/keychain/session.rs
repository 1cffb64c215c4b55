//! Auto-lock bookkeeping: an inactivity window and a monotonic deadline.
//!
//! The session itself never runs a timer.  Whoever drives the keychain
//! (an event loop, a UI tick, or [`super::watchdog`]) asks whether the
//! deadline has passed.

use std::time::{Duration, Instant};

/// Default inactivity window before an unlocked keychain locks itself.
pub const DEFAULT_AUTO_LOCK: Duration = Duration::from_secs(60);

/// Cadence at which the watchdog checks the deadline.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Session {
    window: Duration,
    armed: bool,
    /// `None` while disarmed, or when `window` runs past the end of time.
    deadline: Option<Instant>,
}

impl Session {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed: false,
            deadline: None,
        }
    }

    /// Start counting from `now` (called on unlock).
    ///
    /// A window too large to represent leaves no deadline at all.
    pub fn arm(&mut self, now: Instant) {
        self.armed = true;
        self.deadline = now.checked_add(self.window);
    }

    /// Push the deadline forward.  No-op while disarmed.
    pub fn reschedule(&mut self, now: Instant) {
        if self.armed {
            self.arm(now);
        }
    }

    /// Forget the deadline (called on lock).
    pub fn disarm(&mut self) {
        self.armed = false;
        self.deadline = None;
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Change the inactivity window; applies from the next reschedule.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_LOCK)
    }
}
