//! Timer Controller: drives the countdown and fires expiry once.

use std::time::Duration;

use testset_core::SessionTiming;

/// Cadence of the countdown refresh.
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// What a single tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    /// Seconds left, or `None` while timing is missing.
    pub remaining: Option<u64>,
    /// Minutes since start, for the `actualDuration` write-back.
    pub elapsed_minutes: Option<u32>,
    /// True on the one tick that first saw the countdown at zero.
    pub expired: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TimerController {
    timing: Option<SessionTiming>,
    fired: bool,
}

impl TimerController {
    #[must_use]
    pub fn new(timing: Option<SessionTiming>) -> Self {
        Self {
            timing,
            fired: false,
        }
    }

    #[must_use]
    pub fn timing(&self) -> Option<SessionTiming> {
        self.timing
    }

    /// Adopts timing read back from the store.
    ///
    /// Unreadable timing (`None`) leaves the current timing in place. The
    /// expiry flag survives, so a resync never fires a second expiry.
    pub fn retime(&mut self, timing: Option<SessionTiming>) {
        if timing.is_some() {
            self.timing = timing;
        }
    }

    #[must_use]
    pub fn remaining(&self, now_ms: i64) -> Option<u64> {
        self.timing.map(|timing| timing.remaining_seconds(now_ms))
    }

    #[must_use]
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.timing.is_some_and(|timing| timing.is_expired(now_ms))
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn tick(&mut self, now_ms: i64) -> TimerTick {
        let Some(timing) = self.timing else {
            return TimerTick {
                remaining: None,
                elapsed_minutes: None,
                expired: false,
            };
        };

        let remaining = timing.remaining_seconds(now_ms);
        let expired = remaining == 0 && !self.fired;
        if expired {
            self.fired = true;
            tracing::info!(start_time_ms = timing.start_time_ms(), "countdown reached zero");
        }

        TimerTick {
            remaining: Some(remaining),
            elapsed_minutes: Some(timing.elapsed_minutes(now_ms)),
            expired,
        }
    }
}
