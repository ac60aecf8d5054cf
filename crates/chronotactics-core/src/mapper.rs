//! Boundary to the game layer that turns events into units.
//!
//! The classification heuristics live with the game; this crate only fixes
//! the shape of the call so every sync source feeds the same function.

use crate::event::NormalizedEvent;

/// Maps one normalized event to one game entity.
///
/// Implementations must be pure: the same event always yields the same unit.
pub trait UnitMapper {
    /// The game entity produced for each event.
    type Unit;

    /// Maps a single event.
    fn map_event(&self, event: &NormalizedEvent) -> Self::Unit;

    /// Maps a batch of events, preserving order.
    fn map_events(&self, events: &[NormalizedEvent]) -> Vec<Self::Unit> {
        events.iter().map(|e| self.map_event(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    struct HoursMapper;

    impl UnitMapper for HoursMapper {
        type Unit = (String, i64);

        fn map_event(&self, event: &NormalizedEvent) -> Self::Unit {
            let hours = (event.end - event.start).num_hours().max(1);
            (event.summary.clone(), hours)
        }
    }

    #[test]
    fn maps_batch_in_order() {
        let start = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
        let events = vec![
            NormalizedEvent::new("Algorithm Class", start, start + chrono::Duration::hours(2)),
            NormalizedEvent::new("Coffee", start, start),
        ];

        let units = HoursMapper.map_events(&events);
        assert_eq!(
            units,
            vec![("Algorithm Class".to_string(), 2), ("Coffee".to_string(), 1)]
        );
    }
}
