//! Forgiving line-oriented scan of calendar text.
//!
//! Only `UID`, `SUMMARY`, `DESCRIPTION`, `DTSTART`, `DTEND` and `RRULE` are
//! read. Times are compact `YYYYMMDD[THHMM..]` values taken as local
//! wall-clock time; seconds and any `Z` suffix are ignored. Blocks without a
//! summary, a start or an end are dropped.

use std::sync::LazyLock;

use chrono::NaiveDate;
use chronotactics_core::NormalizedEvent;
use regex::Regex;
use tracing::{debug, warn};

use super::{NormalizeError, ParsedTime, local_to_utc};

static COMPACT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})(\d{2})(\d{2})(?:T(\d{2})(\d{2}))?")
        .expect("compact date regex should be valid")
});

/// Fields collected from one `BEGIN:VEVENT`..`END:VEVENT` block.
#[derive(Debug, Default)]
struct EventBlock {
    uid: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    start: ParsedTime,
    end: ParsedTime,
    is_recurring: bool,
}

impl EventBlock {
    fn apply(&mut self, line: &str) {
        if let Some(value) = line.strip_prefix("UID:") {
            self.uid = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("SUMMARY:") {
            self.summary = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("DESCRIPTION:") {
            self.description = Some(value.to_string());
        } else if let Some(value) = property_value(line, "DTSTART") {
            self.start = parse_compact(value);
        } else if let Some(value) = property_value(line, "DTEND") {
            self.end = parse_compact(value);
        } else if line.starts_with("RRULE:") {
            self.is_recurring = true;
        }
    }

    fn finish(self) -> Result<NormalizedEvent, NormalizeError> {
        let summary = self
            .summary
            .filter(|s| !s.trim().is_empty())
            .ok_or(NormalizeError::Incomplete("SUMMARY"))?;
        let start = self.start.resolved().ok_or(NormalizeError::Incomplete("DTSTART"))?;
        let end = self.end.resolved().ok_or(NormalizeError::Incomplete("DTEND"))?;

        let mut event = NormalizedEvent::new(summary, start, end)
            .with_description(self.description.unwrap_or_default())
            .with_recurring(self.is_recurring);
        if let Some(uid) = self.uid.filter(|uid| !uid.is_empty()) {
            event = event.with_uid(uid);
        }
        Ok(event)
    }
}

/// Returns the value of `NAME:value` or `NAME;PARAMS:value`.
fn property_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    if let Some(value) = rest.strip_prefix(':') {
        Some(value)
    } else if rest.starts_with(';') {
        rest.split(':').nth(1)
    } else {
        None
    }
}

/// Reads a compact date or date-time as local time.
///
/// A bare date is local midnight.
fn parse_compact(value: &str) -> ParsedTime {
    let Some(caps) = COMPACT_DATE.captures(value.trim()) else {
        return ParsedTime::Absent;
    };

    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let (Some(year), Some(month), Some(day)) = (num(1), num(2), num(3)) else {
        return ParsedTime::Absent;
    };
    let hour = num(4).unwrap_or(0);
    let minute = num(5).unwrap_or(0);

    NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .map_or(ParsedTime::Absent, local_to_utc)
}

/// Scans `text` for event blocks, normalizing each one.
///
/// Returns one result per closed block, in order. A block left open at the
/// end of the text is ignored; a `BEGIN:VEVENT` inside an open block starts
/// over.
pub fn normalize_lines(text: &str) -> Vec<Result<NormalizedEvent, NormalizeError>> {
    let mut results = Vec::new();
    let mut current: Option<EventBlock> = None;

    for line in text.split(['\r', '\n']) {
        if line.starts_with("BEGIN:VEVENT") {
            current = Some(EventBlock::default());
        } else if line.starts_with("END:VEVENT") {
            if let Some(block) = current.take() {
                results.push(block.finish());
            }
        } else if let Some(block) = current.as_mut() {
            block.apply(line);
        }
    }

    if current.is_some() {
        debug!("Ignoring unterminated VEVENT block");
    }

    results
}

/// Normalizes every block of every text, dropping incomplete events.
pub fn normalize_lines_batch<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<NormalizedEvent> {
    texts
        .into_iter()
        .flat_map(normalize_lines)
        .filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Dropping event block");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local, TimeZone, Timelike, Utc};

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        let naive = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap();
        Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    const TWO_EVENTS: &str = "BEGIN:VCALENDAR
VERSION:2.0
BEGIN:VEVENT
UID:icloud-demo-1
SUMMARY:Algorithm Class
DESCRIPTION:Advanced Graph Theory
DTSTART:20240315T090000
DTEND:20240315T110000
RRULE:FREQ=WEEKLY
END:VEVENT
BEGIN:VEVENT
UID:icloud-demo-2
SUMMARY:Team Sync
DTSTART:20240315T140000
DTEND:20240315T150000
END:VEVENT
END:VCALENDAR";

    #[test]
    fn reads_every_block() {
        let events: Vec<_> = normalize_lines(TWO_EVENTS)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].uid.as_deref(), Some("icloud-demo-1"));
        assert_eq!(events[0].summary, "Algorithm Class");
        assert_eq!(events[0].description, "Advanced Graph Theory");
        assert_eq!(events[0].start, local(2024, 3, 15, 9, 0));
        assert_eq!(events[0].end, local(2024, 3, 15, 11, 0));
        assert!(events[0].is_recurring);
        assert!(!events[1].is_recurring);
        assert_eq!(events[1].description, "");
    }

    #[test]
    fn crlf_input_is_accepted() {
        let text = TWO_EVENTS.replace('\n', "\r\n");
        assert_eq!(normalize_lines_batch([text.as_str()]).len(), 2);
    }

    #[test]
    fn seconds_and_zulu_are_ignored() {
        let text = "BEGIN:VEVENT\nSUMMARY:Late\nDTSTART:20240315T093045Z\nDTEND:20240315T100059Z\nEND:VEVENT";
        let event = normalize_lines(text).remove(0).unwrap();

        assert_eq!(event.start, local(2024, 3, 15, 9, 30));
        assert_eq!(event.end.with_timezone(&Local).second(), 0);
    }

    #[test]
    fn parameterized_dates() {
        let text = "BEGIN:VEVENT\nSUMMARY:Holiday\nDTSTART;VALUE=DATE:20240320\nDTEND;TZID=Europe/Paris:20240321T083000\nEND:VEVENT";
        let event = normalize_lines(text).remove(0).unwrap();

        assert_eq!(event.start, local(2024, 3, 20, 0, 0));
        assert_eq!(event.end, local(2024, 3, 21, 8, 30));
    }

    #[test]
    fn incomplete_blocks_are_dropped() {
        let text = "BEGIN:VEVENT\nDTSTART:20240315T090000\nDTEND:20240315T100000\nEND:VEVENT\n\
                    BEGIN:VEVENT\nSUMMARY:No end\nDTSTART:20240315T090000\nEND:VEVENT\n\
                    BEGIN:VEVENT\nSUMMARY:Bad start\nDTSTART:soon\nDTEND:20240315T100000\nEND:VEVENT\n\
                    BEGIN:VEVENT\nSUMMARY:Kept\nDTSTART:20240315T090000\nDTEND:20240315T100000\nEND:VEVENT";

        let results = normalize_lines(text);
        assert_eq!(results[0], Err(NormalizeError::Incomplete("SUMMARY")));
        assert_eq!(results[1], Err(NormalizeError::Incomplete("DTEND")));
        assert_eq!(results[2], Err(NormalizeError::Incomplete("DTSTART")));

        let kept = normalize_lines_batch([text]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].summary, "Kept");
    }

    #[test]
    fn unterminated_block_is_ignored() {
        let text = "BEGIN:VEVENT\nSUMMARY:Open\nDTSTART:20240315T090000\nDTEND:20240315T100000\n";
        assert!(normalize_lines(text).is_empty());
    }

    #[test]
    fn lines_outside_blocks_are_ignored() {
        let text = "SUMMARY:Stray\nBEGIN:VEVENT\nSUMMARY:Inside\nDTSTART:20240315T090000\nDTEND:20240315T100000\nEND:VEVENT";
        let events = normalize_lines_batch([text]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Inside");
    }
}
