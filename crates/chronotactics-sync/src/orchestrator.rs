//! End-to-end sync: probe, live path, fallback.
//!
//! A sync always yields a [`SyncResult`]. The service is probed first; when
//! it answers, discovery and fetching run under one session timeout. Any
//! failure or timeout on that path, or an account without calendars, is
//! logged and answered with the fallback dataset instead. Per-collection
//! fetch failures and unparseable objects only shrink the live result.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use chronotactics_core::{NormalizedEvent, SyncResult, SyncSource};
use tracing::{debug, info, warn};

use crate::caldav::{
    CalDavClient, CalDavConfig, Credentials, DiscoveryClient, DiscoverySession, EventFetcher,
};
use crate::error::{DiscoveryStage, ProviderError, ProviderResult, SyncError};
use crate::fallback;
use crate::ics::{normalize_lines_batch, normalize_structured_batch};
use crate::transport::{DavMethod, DavRequest, DavTransport, HttpTransport};

/// Timing and fallback settings for a sync.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bound on the reachability probe.
    pub probe_timeout: Duration,
    /// Bound on discovery plus fetching.
    pub session_timeout: Duration,
    /// Calendar text served instead of the bundled dataset, if set.
    pub fallback_ics: Option<String>,
}

impl SyncConfig {
    /// Default probe timeout in seconds.
    pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 2;

    /// Default session timeout in seconds.
    pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 15;

    /// Sets the probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the session timeout.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Replaces the bundled fallback dataset.
    pub fn with_fallback_ics(mut self, text: impl Into<String>) -> Self {
        self.fallback_ics = Some(text.into());
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(Self::DEFAULT_PROBE_TIMEOUT_SECS),
            session_timeout: Duration::from_secs(Self::DEFAULT_SESSION_TIMEOUT_SECS),
            fallback_ics: None,
        }
    }
}

/// Runs syncs against one CalDAV service.
pub struct SyncOrchestrator {
    transport: Arc<dyn DavTransport>,
    caldav: CalDavConfig,
    config: SyncConfig,
}

impl SyncOrchestrator {
    /// Creates an orchestrator over the given transport.
    pub fn new(transport: Arc<dyn DavTransport>, caldav: CalDavConfig, config: SyncConfig) -> Self {
        Self {
            transport,
            caldav,
            config,
        }
    }

    /// Creates an orchestrator over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_http(caldav: CalDavConfig, config: SyncConfig) -> ProviderResult<Self> {
        let transport = HttpTransport::new(&caldav)?;
        Ok(Self::new(Arc::new(transport), caldav, config))
    }

    /// Returns the CalDAV configuration.
    pub fn caldav_config(&self) -> &CalDavConfig {
        &self.caldav
    }

    /// Returns the sync configuration.
    pub fn sync_config(&self) -> &SyncConfig {
        &self.config
    }

    /// Checks whether the service answers at all.
    ///
    /// Sends an unauthenticated OPTIONS to the service root. Any HTTP
    /// response counts as reachable; no response within the probe timeout
    /// does not.
    pub async fn probe(&self) -> bool {
        let request = DavRequest::new(DavMethod::Options, self.caldav.url_str());

        match tokio::time::timeout(self.config.probe_timeout, self.transport.send(request)).await {
            Ok(Ok(response)) => {
                debug!(status = response.status, "Service reachable");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Service probe failed");
                false
            }
            Err(_) => {
                warn!(timeout = ?self.config.probe_timeout, "Service probe timed out");
                false
            }
        }
    }

    /// Syncs the account, falling back to the local dataset when the live
    /// path is unavailable.
    pub async fn sync(&self, credentials: Credentials) -> SyncResult {
        let started = Utc::now();

        if !self.probe().await {
            info!("Service unreachable, serving fallback dataset");
            return self.simulate();
        }

        let session_timeout = self.config.session_timeout;
        let live = tokio::time::timeout(session_timeout, self.live(credentials, started));
        let error = match live.await {
            Ok(Ok(events)) => {
                info!(count = events.len(), "Live sync complete");
                return SyncResult::new(SyncSource::Live, events, Utc::now());
            }
            Ok(Err(e)) => e,
            Err(_) => SyncError::SessionTimeout(session_timeout),
        };

        warn!(error = %error, "Live sync failed, serving fallback dataset");
        self.simulate()
    }

    /// Returns the fallback dataset as a simulated result.
    pub fn simulate(&self) -> SyncResult {
        let events = match self.config.fallback_ics.as_deref() {
            Some(text) => normalize_lines_batch([text]),
            None => fallback::events(Local::now().date_naive()),
        };
        SyncResult::new(SyncSource::Simulated, events, Utc::now())
    }

    /// Runs discovery only, under the session timeout.
    ///
    /// # Errors
    ///
    /// Returns the failing stage's error, or [`SyncError::SessionTimeout`].
    pub async fn discover(&self, credentials: Credentials) -> Result<DiscoverySession, SyncError> {
        let client = CalDavClient::new(self.transport.as_ref(), credentials, self.caldav.timeout);
        let discovery = DiscoveryClient::new(client, &self.caldav);

        tokio::time::timeout(self.config.session_timeout, discovery.discover())
            .await
            .map_err(|_| SyncError::SessionTimeout(self.config.session_timeout))?
    }

    async fn live(
        &self,
        credentials: Credentials,
        now: DateTime<Utc>,
    ) -> Result<Vec<NormalizedEvent>, SyncError> {
        let client = CalDavClient::new(self.transport.as_ref(), credentials, self.caldav.timeout);
        let discovery = DiscoveryClient::new(client, &self.caldav);

        let session = discovery.discover().await?;
        if session.collections().is_empty() {
            return Err(SyncError::discovery(
                DiscoveryStage::List,
                ProviderError::calendar("account has no calendar collections"),
            ));
        }

        let objects = EventFetcher::new(discovery.client(), self.caldav.fetch_window(now))
            .with_max_concurrent(self.caldav.max_concurrent_fetches)
            .fetch_all(session.collections())
            .await;

        let texts = objects.iter().map(|o| (o.href.as_str(), o.text.as_str()));
        Ok(normalize_structured_batch(texts, now))
    }
}
