//! Event types shared by every sync source.
//!
//! - [`NormalizedEvent`]: the single record shape every calendar source is
//!   reduced to, and the JSON output contract of the pipeline
//! - [`SyncSource`]: where a batch of events came from
//! - [`SyncResult`]: one sync's sorted batch, tagged with its source

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary used when an event carries no usable title.
pub const UNTITLED_SUMMARY: &str = "Untitled Event";

/// Returns `summary` trimmed, or [`UNTITLED_SUMMARY`] when it is absent or blank.
pub fn summary_or_default(summary: Option<&str>) -> String {
    match summary.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNTITLED_SUMMARY.to_string(),
    }
}

/// A calendar event in the shape consumed downstream.
///
/// Serializes as `{"uid", "summary", "start", "end", "description",
/// "isRecurring"}`. External event sources (for example a device-native
/// calendar bridge) emit exactly this shape.
///
/// `end` is carried as received and is not checked against `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    /// Calendar UID, when the source provided one.
    #[serde(default)]
    pub uid: Option<String>,
    /// Event title; never empty once normalized.
    #[serde(default)]
    pub summary: String,
    /// Start of the event.
    pub start: DateTime<Utc>,
    /// End of the event.
    pub end: DateTime<Utc>,
    /// Free-form description, empty when absent.
    #[serde(default)]
    pub description: String,
    /// Whether the source event carries a recurrence rule.
    #[serde(default)]
    pub is_recurring: bool,
}

impl NormalizedEvent {
    /// Creates an event with the given title and times.
    ///
    /// A blank title is replaced with [`UNTITLED_SUMMARY`].
    pub fn new(summary: impl AsRef<str>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            uid: None,
            summary: summary_or_default(Some(summary.as_ref())),
            start,
            end,
            description: String::new(),
            is_recurring: false,
        }
    }

    /// Builder method to set the UID.
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the recurrence flag.
    pub fn with_recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = is_recurring;
        self
    }

    /// Replaces a blank summary with [`UNTITLED_SUMMARY`].
    ///
    /// Used on events decoded from external JSON, which bypass [`Self::new`].
    pub fn with_default_summary(mut self) -> Self {
        self.summary = summary_or_default(Some(&self.summary));
        self
    }
}

/// Sorts events ascending by start time.
///
/// The sort is stable, so events starting at the same instant keep their
/// relative order.
pub fn sort_by_start(events: &mut [NormalizedEvent]) {
    events.sort_by_key(|e| e.start);
}

/// Where the events of a [`SyncResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncSource {
    /// Fetched from the remote calendar service.
    Live,
    /// Produced from the local fallback dataset.
    Simulated,
}

impl SyncSource {
    /// Returns the wire name of this source.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::Simulated => "SIMULATED",
        }
    }
}

impl fmt::Display for SyncSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one sync call.
///
/// Events are always sorted ascending by start, whatever the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    source: SyncSource,
    events: Vec<NormalizedEvent>,
    synced_at: DateTime<Utc>,
}

impl SyncResult {
    /// Creates a result, sorting `events` by start.
    pub fn new(
        source: SyncSource,
        mut events: Vec<NormalizedEvent>,
        synced_at: DateTime<Utc>,
    ) -> Self {
        sort_by_start(&mut events);
        Self {
            source,
            events,
            synced_at,
        }
    }

    /// Returns where the events came from.
    pub fn source(&self) -> SyncSource {
        self.source
    }

    /// Returns true if the events came from the remote service.
    pub fn is_live(&self) -> bool {
        self.source == SyncSource::Live
    }

    /// Returns the sorted events.
    pub fn events(&self) -> &[NormalizedEvent] {
        &self.events
    }

    /// Returns when the sync completed.
    pub fn synced_at(&self) -> DateTime<Utc> {
        self.synced_at
    }

    /// Consumes the result, returning its events.
    pub fn into_events(self) -> Vec<NormalizedEvent> {
        self.events
    }

    /// Appends this result's events after the events the caller already holds.
    ///
    /// No de-duplication by UID is performed: an event synced twice appears
    /// twice.
    pub fn merge_into(self, mut held: Vec<NormalizedEvent>) -> Vec<NormalizedEvent> {
        held.extend(self.events);
        held
    }
}
