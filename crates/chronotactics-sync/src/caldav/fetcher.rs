//! Range queries over discovered collections.

use chronotactics_core::TimeWindow;
use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, warn};

use crate::error::SyncError;

use super::client::CalDavClient;
use super::discovery::CalendarRef;
use super::xml::{calendar_query_body, parse_report_response};

/// One calendar object as returned by the server, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawCalendarObject {
    /// URL of the collection it came from.
    pub collection: String,
    /// The object's href.
    pub href: String,
    /// Encoded calendar text.
    pub text: String,
}

/// Queries each collection for the objects inside a time window.
pub(crate) struct EventFetcher<'a, 't> {
    client: &'a CalDavClient<'t>,
    window: TimeWindow,
    max_concurrent: usize,
}

impl<'a, 't> EventFetcher<'a, 't> {
    pub fn new(client: &'a CalDavClient<'t>, window: TimeWindow) -> Self {
        Self {
            client,
            window,
            max_concurrent: 1,
        }
    }

    /// Sets how many collections are queried at once. Zero is treated as one.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Fetches every collection, skipping the ones that fail.
    ///
    /// Objects are returned grouped by collection, in completion order.
    pub async fn fetch_all(&self, collections: &[CalendarRef]) -> Vec<RawCalendarObject> {
        let body = match calendar_query_body(self.window) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to build calendar-query body");
                return Vec::new();
            }
        };

        let results: Vec<_> = stream::iter(collections)
            .map(|calendar| self.fetch_collection(calendar, &body))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut objects = Vec::new();
        for result in results {
            match result {
                Ok(fetched) => objects.extend(fetched),
                Err(e) => warn!(error = %e, "Skipping collection"),
            }
        }
        objects
    }

    async fn fetch_collection(
        &self,
        calendar: &CalendarRef,
        body: &str,
    ) -> Result<Vec<RawCalendarObject>, SyncError> {
        debug!(
            calendar = %calendar.url,
            start = %self.window.start,
            end = %self.window.end,
            "Fetching events with REPORT"
        );

        let xml = self
            .client
            .report(&calendar.url, body)
            .await
            .map_err(|e| SyncError::fetch(&calendar.url, e))?;

        let objects: Vec<RawCalendarObject> = parse_report_response(&xml)
            .into_iter()
            .map(|item| RawCalendarObject {
                collection: calendar.url.clone(),
                href: item.href,
                text: item.data,
            })
            .collect();

        debug!(calendar = %calendar.url, count = objects.len(), "Fetched calendar objects");
        Ok(objects)
    }
}
