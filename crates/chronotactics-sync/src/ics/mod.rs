//! Calendar text to [`NormalizedEvent`](chronotactics_core::NormalizedEvent).
//!
//! Two modes:
//! - structured: a full iCalendar parse of one calendar object; missing
//!   fields are filled with defaults, times honour UTC, floating and TZID
//!   forms
//! - line: a forgiving scan for `BEGIN:VEVENT`..`END:VEVENT` blocks that reads
//!   every time as local wall-clock time and drops incomplete events
//!
//! Live results go through the structured mode, the fallback dataset through
//! the line mode.

mod lines;
mod structured;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

pub use lines::{normalize_lines, normalize_lines_batch};
pub use structured::{normalize_structured, normalize_structured_batch};

/// A date-time field as read from calendar text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsedTime {
    /// The field was present and understood.
    Resolved(DateTime<Utc>),
    /// The field was missing or unreadable.
    #[default]
    Absent,
}

impl ParsedTime {
    /// Returns the instant, if resolved.
    pub fn resolved(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Resolved(dt) => Some(dt),
            Self::Absent => None,
        }
    }

    /// Returns the instant, or `default` when absent.
    pub fn or(self, default: DateTime<Utc>) -> DateTime<Utc> {
        self.resolved().unwrap_or(default)
    }
}

/// Why a piece of calendar text produced no event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The text is not valid iCalendar.
    #[error("malformed calendar text: {0}")]
    Malformed(String),
    /// The text parsed but holds no VEVENT.
    #[error("calendar text holds no VEVENT")]
    NoEvent,
    /// A line-mode block lacks a required field.
    #[error("event is missing {0}")]
    Incomplete(&'static str),
}

/// Interprets a wall-clock time in the host's local zone.
///
/// Nonexistent local times (inside a DST gap) resolve to `Absent`; ambiguous
/// ones take the earlier instant.
pub(crate) fn local_to_utc(naive: NaiveDateTime) -> ParsedTime {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map_or(ParsedTime::Absent, |dt| {
            ParsedTime::Resolved(dt.with_timezone(&Utc))
        })
}
