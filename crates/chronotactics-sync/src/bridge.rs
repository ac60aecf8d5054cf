//! Events handed over by a device-native calendar bridge.
//!
//! The bridge emits a JSON array of `{uid, summary, start, end, description,
//! isRecurring}` objects with ISO 8601 times, which is the serialized form of
//! [`NormalizedEvent`]. Such events enter the pipeline here and are then
//! treated like any other source.

use chronotactics_core::{NormalizedEvent, sort_by_start};

/// Decodes a bridge payload, defaulting blank summaries and sorting by start.
///
/// # Errors
///
/// Returns the JSON error when the payload is not an array of events.
pub fn decode_bridge_events(json: &str) -> Result<Vec<NormalizedEvent>, serde_json::Error> {
    let mut events: Vec<NormalizedEvent> = serde_json::from_str::<Vec<NormalizedEvent>>(json)?
        .into_iter()
        .map(NormalizedEvent::with_default_summary)
        .collect();
    sort_by_start(&mut events);
    Ok(events)
}
