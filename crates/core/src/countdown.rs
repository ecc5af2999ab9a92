//! Wall-clock countdown arithmetic for a timed attempt.
//!
//! Remaining time is always derived from `now - start_time` instead of being
//! decremented in memory, so it stays correct across sleep and suspend.

/// Start instant and allotted length of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    start_time_ms: i64,
    duration_minutes: u32,
}

impl SessionTiming {
    #[must_use]
    pub fn new(start_time_ms: i64, duration_minutes: u32) -> Self {
        Self {
            start_time_ms,
            duration_minutes,
        }
    }

    #[must_use]
    pub fn start_time_ms(&self) -> i64 {
        self.start_time_ms
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Allotted time in whole seconds.
    #[must_use]
    pub fn allotted_seconds(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    /// Whole seconds elapsed since start. A clock reading earlier than the
    /// start counts as zero elapsed.
    #[must_use]
    pub fn elapsed_seconds(&self, now_ms: i64) -> u64 {
        let elapsed_ms = now_ms.saturating_sub(self.start_time_ms).max(0);
        u64::try_from(elapsed_ms / 1000).unwrap_or(0)
    }

    /// Whole minutes elapsed since start; written back as `actualDuration`.
    #[must_use]
    pub fn elapsed_minutes(&self, now_ms: i64) -> u32 {
        let elapsed_ms = now_ms.saturating_sub(self.start_time_ms).max(0);
        u32::try_from(elapsed_ms / 60_000).unwrap_or(u32::MAX)
    }

    /// `max(0, duration * 60 - elapsed_seconds)`.
    #[must_use]
    pub fn remaining_seconds(&self, now_ms: i64) -> u64 {
        self.allotted_seconds()
            .saturating_sub(self.elapsed_seconds(now_ms))
    }

    #[must_use]
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.remaining_seconds(now_ms) == 0
    }
}

/// Formats remaining seconds as `MM:SS`.
///
/// `None` stands for timing that is missing or malformed and renders as
/// `00:00`. Minutes are not folded into hours.
#[must_use]
pub fn format_remaining(remaining: Option<u64>) -> String {
    let Some(total) = remaining else {
        return "00:00".to_string();
    };
    let minutes = total / 60;
    let seconds = total % 60;
    format!("{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: i64 = 1_700_000_000_000;

    #[test]
    fn remaining_counts_down_from_allotment() {
        let timing = SessionTiming::new(START, 30);
        assert_eq!(timing.remaining_seconds(START), 1800);
        assert_eq!(timing.remaining_seconds(START + 999), 1800);
        assert_eq!(timing.remaining_seconds(START + 1000), 1799);
        assert_eq!(timing.remaining_seconds(START + 29 * 60_000 + 30_000), 30);
    }

    #[test]
    fn remaining_never_goes_negative() {
        let timing = SessionTiming::new(START, 30);
        assert_eq!(timing.remaining_seconds(START + 31 * 60_000), 0);
        assert!(timing.is_expired(START + 31 * 60_000));
        assert_eq!(timing.remaining_seconds(i64::MAX), 0);
    }

    #[test]
    fn remaining_is_monotonically_non_increasing() {
        let timing = SessionTiming::new(START, 2);
        let mut previous = u64::MAX;
        for step in 0..400 {
            let now = START + step * 437;
            let remaining = timing.remaining_seconds(now);
            assert!(remaining <= previous, "remaining grew at step {step}");
            previous = remaining;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn clock_before_start_counts_as_no_elapsed_time() {
        let timing = SessionTiming::new(START, 10);
        assert_eq!(timing.remaining_seconds(START - 60_000), 600);
        assert_eq!(timing.elapsed_minutes(START - 60_000), 0);
    }

    #[test]
    fn elapsed_minutes_floor() {
        let timing = SessionTiming::new(START, 10);
        assert_eq!(timing.elapsed_minutes(START + 59_999), 0);
        assert_eq!(timing.elapsed_minutes(START + 60_000), 1);
        assert_eq!(timing.elapsed_minutes(START + 150_000), 2);
    }

    #[test]
    fn format_pads_and_handles_missing_timing() {
        assert_eq!(format_remaining(Some(0)), "00:00");
        assert_eq!(format_remaining(Some(65)), "01:05");
        assert_eq!(format_remaining(Some(90 * 60)), "90:00");
        assert_eq!(format_remaining(None), "00:00");
    }

    #[test]
    fn zero_duration_is_immediately_expired() {
        let timing = SessionTiming::new(START, 0);
        assert!(timing.is_expired(START));
    }
}
