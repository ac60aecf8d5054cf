//! Calendar sync pipeline.
//!
//! This crate turns a CalDAV account into a sorted list of
//! [`NormalizedEvent`](chronotactics_core::NormalizedEvent)s:
//!
//! - [`caldav`] - Discovery of the account's calendar collections and range
//!   queries over them
//! - [`ics`] - Calendar text to normalized events, in structured and line mode
//! - [`SyncOrchestrator`] - Probe, live path and fallback, with timeouts
//! - [`DavTransport`] - The HTTP seam, backed by reqwest
//!
//! # Architecture
//!
//! ```text
//!   probe (OPTIONS) ──unreachable──────────────────────────┐
//!        │                                                 │
//!        ▼                                                 │
//! ┌──────────────────┐   principal → home → collections    │
//! │ DiscoveryClient  │──────────failure/none───────────────┤
//! └────────┬─────────┘                                     │
//!          ▼                                               │
//! ┌──────────────────┐   REPORT per collection,            │
//! │  EventFetcher    │   failures skipped                  │
//! └────────┬─────────┘                                     │
//!          ▼ structured mode                               ▼ line mode
//! ┌──────────────────┐                           ┌──────────────────┐
//! │  SyncResult LIVE │                           │ SyncResult       │
//! │                  │                           │ SIMULATED        │
//! └──────────────────┘                           └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use chronotactics_sync::{CalDavConfig, Credentials, SyncConfig, SyncOrchestrator};
//!
//! let orchestrator = SyncOrchestrator::with_http(CalDavConfig::icloud()?, SyncConfig::default())?;
//! let result = orchestrator.sync(Credentials::new(email, app_password)?).await;
//! println!("{} events ({})", result.events().len(), result.source());
//! ```

pub mod bridge;
pub mod caldav;
pub mod error;
pub mod fallback;
pub mod ics;
pub mod orchestrator;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use bridge::decode_bridge_events;
pub use caldav::{CalDavConfig, CalendarRef, Credentials, DiscoverySession};
pub use error::{DiscoveryStage, ProviderError, ProviderErrorCode, ProviderResult, SyncError};
pub use ics::{NormalizeError, ParsedTime};
pub use orchestrator::{SyncConfig, SyncOrchestrator};
pub use transport::{BoxFuture, DavMethod, DavRequest, DavResponse, DavTransport, HttpTransport};
