//! Query windows for range-bounded calendar fetches.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a window reaching `days_before` days back and `days_after`
    /// days forward from `now`.
    ///
    /// Bounds past the representable range saturate at
    /// [`DateTime::<Utc>::MIN_UTC`] and [`DateTime::<Utc>::MAX_UTC`].
    pub fn around(now: DateTime<Utc>, days_before: u32, days_after: u32) -> Self {
        let start = Duration::try_days(i64::from(days_before))
            .and_then(|back| now.checked_sub_signed(back))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = Duration::try_days(i64::from(days_after))
            .and_then(|ahead| now.checked_add_signed(ahead))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, end }
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }
}
