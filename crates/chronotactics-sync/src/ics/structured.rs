//! Full iCalendar parse of a single calendar object.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use chronotactics_core::NormalizedEvent;
use icalendar::{Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime};
use tracing::{debug, warn};

use super::{NormalizeError, ParsedTime, local_to_utc};

/// Normalizes one calendar object into its first VEVENT.
///
/// Missing fields never reject the event: the summary defaults to
/// "Untitled Event", the description to empty, and an absent or unreadable
/// start or end to `now`. `is_recurring` is true when the event has an
/// RRULE.
///
/// # Errors
///
/// Returns [`NormalizeError::Malformed`] when the text does not parse and
/// [`NormalizeError::NoEvent`] when it holds no VEVENT.
pub fn normalize_structured(
    text: &str,
    now: DateTime<Utc>,
) -> Result<NormalizedEvent, NormalizeError> {
    let calendar = with_crlf(text)
        .parse::<Calendar>()
        .map_err(|e| NormalizeError::Malformed(e.to_string()))?;

    let event = calendar
        .iter()
        .find_map(|component| match component {
            CalendarComponent::Event(event) => Some(event),
            _ => None,
        })
        .ok_or(NormalizeError::NoEvent)?;

    let start = convert_date_time(event.get_start()).or(now);
    let end = convert_date_time(event.get_end()).or(now);

    let mut normalized = NormalizedEvent::new(event.get_summary().unwrap_or_default(), start, end)
        .with_description(event.get_description().unwrap_or_default())
        .with_recurring(event.property_value("RRULE").is_some());

    if let Some(uid) = event.get_uid().filter(|uid| !uid.trim().is_empty()) {
        normalized = normalized.with_uid(uid);
    }

    debug!(
        uid = ?normalized.uid,
        summary = %normalized.summary,
        start = %normalized.start,
        "Parsed event from ICS"
    );

    Ok(normalized)
}

/// Normalizes a batch of `(href, text)` calendar objects, in order,
/// dropping the ones that fail.
pub fn normalize_structured_batch<'a>(
    objects: impl IntoIterator<Item = (&'a str, &'a str)>,
    now: DateTime<Utc>,
) -> Vec<NormalizedEvent> {
    objects
        .into_iter()
        .filter_map(|(href, text)| match normalize_structured(text, now) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(href = %href, error = %e, "Skipping calendar object");
                None
            }
        })
        .collect()
}

/// Converts an icalendar date or date-time to an instant.
///
/// UTC values are taken as-is. Floating values and all-day dates (at
/// midnight) are local. TZID values use the named zone, or local time when
/// the zone is unknown.
fn convert_date_time(value: Option<DatePerhapsTime>) -> ParsedTime {
    match value {
        None => ParsedTime::Absent,
        Some(DatePerhapsTime::Date(date)) => date
            .and_hms_opt(0, 0, 0)
            .map_or(ParsedTime::Absent, local_to_utc),
        Some(DatePerhapsTime::DateTime(cdt)) => match cdt {
            CalendarDateTime::Utc(dt) => ParsedTime::Resolved(dt),
            CalendarDateTime::Floating(naive) => local_to_utc(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => match tzid.parse::<Tz>() {
                Ok(tz) => tz
                    .from_local_datetime(&date_time)
                    .earliest()
                    .map_or(ParsedTime::Absent, |dt| {
                        ParsedTime::Resolved(dt.with_timezone(&Utc))
                    }),
                Err(_) => {
                    debug!(tzid = %tzid, "Unknown TZID, reading time as local");
                    local_to_utc(date_time)
                }
            },
        },
    }
}

/// Rewrites bare LF line endings as CRLF.
fn with_crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate};
    use chronotactics_core::UNTITLED_SUMMARY;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn wrap(body: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\nBEGIN:VEVENT\r\n{body}END:VEVENT\r\nEND:VCALENDAR\r\n"
        )
    }

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

    #[test]
    fn parse_basic_event() {
        let text = wrap(
            "UID:test-event-1@example.com\r\n\
             DTSTART:20250205T100000Z\r\n\
             DTEND:20250205T110000Z\r\n\
             SUMMARY:Team Meeting\r\n\
             DESCRIPTION:Weekly sync meeting\r\n",
        );

        let event = normalize_structured(&text, now()).unwrap();

        assert_eq!(event.uid.as_deref(), Some("test-event-1@example.com"));
        assert_eq!(event.summary, "Team Meeting");
        assert_eq!(event.description, "Weekly sync meeting");
        assert_eq!(event.start, Utc.with_ymd_and_hms(2025, 2, 5, 10, 0, 0).unwrap());
        assert_eq!(event.end, Utc.with_ymd_and_hms(2025, 2, 5, 11, 0, 0).unwrap());
        assert!(!event.is_recurring);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let text = wrap("UID:bare\r\n");

        let event = normalize_structured(&text, now()).unwrap();

        assert_eq!(event.summary, UNTITLED_SUMMARY);
        assert_eq!(event.description, "");
        assert_eq!(event.start, now());
        assert_eq!(event.end, now());
    }

    #[test]
    fn rrule_marks_recurring() {
        let text = wrap(
            "UID:weekly\r\n\
             DTSTART:20240315T090000Z\r\n\
             DTEND:20240315T110000Z\r\n\
             SUMMARY:Algorithm Class\r\n\
             RRULE:FREQ=WEEKLY\r\n",
        );

        assert!(normalize_structured(&text, now()).unwrap().is_recurring);
    }

    #[test]
    fn floating_time_is_local() {
        let text = wrap(
            "UID:floating\r\n\
             DTSTART:20240315T090000\r\n\
             DTEND:20240315T110000\r\n\
             SUMMARY:Algorithm Class\r\n",
        );

        let event = normalize_structured(&text, now()).unwrap();

        assert_eq!(event.start, local(2024, 3, 15, 9, 0));
        assert_eq!(event.end, local(2024, 3, 15, 11, 0));
    }

    #[test]
    fn tzid_time_uses_named_zone() {
        let text = wrap(
            "UID:zoned\r\n\
             DTSTART;TZID=Europe/Paris:20240715T090000\r\n\
             DTEND;TZID=Europe/Paris:20240715T100000\r\n\
             SUMMARY:Paris Standup\r\n",
        );

        let event = normalize_structured(&text, now()).unwrap();

        assert_eq!(event.start, Utc.with_ymd_and_hms(2024, 7, 15, 7, 0, 0).unwrap());
        assert_eq!(event.end, Utc.with_ymd_and_hms(2024, 7, 15, 8, 0, 0).unwrap());
    }

    #[test]
    fn all_day_date_is_local_midnight() {
        let text = wrap(
            "UID:holiday\r\n\
             DTSTART;VALUE=DATE:20250210\r\n\
             DTEND;VALUE=DATE:20250211\r\n\
             SUMMARY:Company Holiday\r\n",
        );

        let event = normalize_structured(&text, now()).unwrap();

        assert_eq!(event.start, local(2025, 2, 10, 0, 0));
        assert_eq!(event.end, local(2025, 2, 11, 0, 0));
    }

    #[test]
    fn bare_newlines_are_accepted() {
        let text = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VEVENT\nUID:lf\nDTSTART:20240315T140000Z\n\
                    DTEND:20240315T150000Z\nSUMMARY:Team Sync\nEND:VEVENT\nEND:VCALENDAR\n";

        let event = normalize_structured(text, now()).unwrap();
        assert_eq!(event.summary, "Team Sync");
    }

    #[test]
    fn calendar_without_event_is_rejected() {
        let text = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VTODO\r\nUID:t\r\nSUMMARY:Chore\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
        assert_eq!(normalize_structured(text, now()), Err(NormalizeError::NoEvent));
    }

    #[test]
    fn batch_drops_failures() {
        let good = wrap(
            "UID:good\r\nDTSTART:20240315T140000Z\r\nDTEND:20240315T150000Z\r\nSUMMARY:Team Sync\r\n",
        );
        let todo = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n";

        let events = normalize_structured_batch(
            [("/a.ics", "not a calendar"), ("/b.ics", good.as_str()), ("/c.ics", todo)],
            now(),
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid.as_deref(), Some("good"));
    }

    #[test]
    fn normalization_is_deterministic() {
        let text = wrap("UID:same\r\nSUMMARY:Repeat\r\n");
        assert_eq!(
            normalize_structured(&text, now()),
            normalize_structured(&text, now())
        );
    }
}
