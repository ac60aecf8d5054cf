//! CalDAV discovery and range queries.
//!
//! # Features
//!
//! - HTTP Basic authentication with an app-specific secret
//! - PROPFIND discovery: principal, calendar home, calendar collections
//! - A configurable calendar home fallback when the principal omits it
//! - REPORT calendar-query over a time window, fanned out across collections
//! - Per-request timeouts and per-collection fault isolation
//!
//! # Example
//!
//! ```ignore
//! use chronotactics_sync::caldav::{CalDavClient, CalDavConfig, Credentials, DiscoveryClient};
//! use chronotactics_sync::transport::HttpTransport;
//!
//! let config = CalDavConfig::icloud()?;
//! let transport = HttpTransport::new(&config)?;
//! let credentials = Credentials::new("ana@icloud.com", "abcd-efgh-ijkl-mnop")?;
//!
//! let client = CalDavClient::new(&transport, credentials, config.timeout);
//! let session = DiscoveryClient::new(client, &config).discover().await?;
//! ```

mod auth;
mod client;
mod config;
mod discovery;
mod fetcher;
mod xml;

pub use auth::{Credentials, basic_auth};
pub use client::{CalDavClient, resolve_href};
pub use config::CalDavConfig;
pub use discovery::{CalendarRef, DiscoveryClient, DiscoverySession};

pub(crate) use fetcher::EventFetcher;
