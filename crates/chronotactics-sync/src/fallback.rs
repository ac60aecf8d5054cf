//! The bundled dataset served when the live path is unavailable.
//!
//! Three events relative to a given local day:
//!
//! | uid             | summary            | when                    | recurring |
//! |-----------------|--------------------|-------------------------|-----------|
//! | `icloud-demo-1` | Algorithm Class    | today 09:00 to 11:00    | weekly    |
//! | `icloud-demo-2` | Team Sync          | today 14:00 to 15:00    | no        |
//! | `icloud-demo-3` | Urgent: Fix Deploy | tomorrow 10:00 to 12:00 | no        |

use chrono::NaiveDate;
use chronotactics_core::NormalizedEvent;

use crate::ics::normalize_lines_batch;

/// Renders the fallback calendar text for `today`.
pub fn dataset(today: NaiveDate) -> String {
    let tomorrow = today.succ_opt().unwrap_or(today);
    let d0 = today.format("%Y%m%d");
    let d1 = tomorrow.format("%Y%m%d");

    format!(
        "BEGIN:VCALENDAR
VERSION:2.0
PRODID:-//ChronoTactics//Fallback//EN
BEGIN:VEVENT
UID:icloud-demo-1
SUMMARY:Algorithm Class
DESCRIPTION:Advanced Graph Theory
DTSTART:{d0}T090000
DTEND:{d0}T110000
RRULE:FREQ=WEEKLY
END:VEVENT
BEGIN:VEVENT
UID:icloud-demo-2
SUMMARY:Team Sync
DTSTART:{d0}T140000
DTEND:{d0}T150000
END:VEVENT
BEGIN:VEVENT
UID:icloud-demo-3
SUMMARY:Urgent: Fix Deploy
DTSTART:{d1}T100000
DTEND:{d1}T120000
END:VEVENT
END:VCALENDAR
"
    )
}

/// Returns the fallback events for `today`, via the line-mode normalizer.
pub fn events(today: NaiveDate) -> Vec<NormalizedEvent> {
    normalize_lines_batch([dataset(today).as_str()])
}
