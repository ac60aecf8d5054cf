//! Three-step CalDAV discovery.
//!
//! 1. PROPFIND Depth 0 on the service root for `current-user-principal`
//! 2. PROPFIND Depth 0 on the principal for `calendar-home-set`
//! 3. PROPFIND Depth 1 on the home, keeping collections typed `calendar`

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{DiscoveryStage, ProviderError, SyncError};

use super::client::{CalDavClient, resolve_href};
use super::config::CalDavConfig;
use super::xml::{
    parse_collections, parse_property_href, propfind_collections_body, propfind_home_set_body,
    propfind_principal_body,
};

/// A calendar collection found under the calendar home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRef {
    /// Absolute URL of the collection.
    pub url: String,
    /// Display name, when the server reports one.
    pub display_name: Option<String>,
}

/// Everything discovery learned about an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySession {
    principal_url: String,
    calendar_home_url: String,
    collections: Vec<CalendarRef>,
}

impl DiscoverySession {
    /// Returns the absolute principal URL.
    pub fn principal_url(&self) -> &str {
        &self.principal_url
    }

    /// Returns the absolute calendar home URL.
    pub fn calendar_home_url(&self) -> &str {
        &self.calendar_home_url
    }

    /// Returns the calendar collections, possibly none.
    pub fn collections(&self) -> &[CalendarRef] {
        &self.collections
    }
}

/// Walks from the service root to the account's calendar collections.
pub struct DiscoveryClient<'t> {
    client: CalDavClient<'t>,
    config: &'t CalDavConfig,
}

impl<'t> DiscoveryClient<'t> {
    /// Creates a discovery client for the service described by `config`.
    pub fn new(client: CalDavClient<'t>, config: &'t CalDavConfig) -> Self {
        Self { client, config }
    }

    /// Returns the authenticated client, for use by later stages.
    pub fn client(&self) -> &CalDavClient<'t> {
        &self.client
    }

    /// Resolves the current user principal.
    ///
    /// # Errors
    ///
    /// Fails at [`DiscoveryStage::Principal`] on a transport or status error,
    /// or when the answer carries no principal href.
    pub async fn resolve_principal(&self) -> Result<String, SyncError> {
        let root = self.config.url_str();
        let stage = |e: ProviderError| SyncError::discovery(DiscoveryStage::Principal, e);

        debug!(url = %root, "Resolving current user principal");

        let body = propfind_principal_body().map_err(stage)?;
        let xml = self.client.propfind(root, &body, 0).await.map_err(stage)?;

        parse_property_href(&xml, "current-user-principal")
            .and_then(|href| resolve_href(root, &href))
            .ok_or_else(|| {
                stage(ProviderError::invalid_response(
                    "response carried no current-user-principal href",
                ))
            })
    }

    /// Resolves the calendar home for `principal`.
    ///
    /// When the answer holds no usable home href, the configured fallback
    /// template is used instead.
    ///
    /// # Errors
    ///
    /// Fails at [`DiscoveryStage::CalendarHome`] on a transport or status
    /// error, or when no home can be found and no fallback is configured.
    pub async fn resolve_calendar_home(&self, principal: &str) -> Result<String, SyncError> {
        let stage = |e: ProviderError| SyncError::discovery(DiscoveryStage::CalendarHome, e);

        debug!(principal = %principal, "Resolving calendar home");

        let body = propfind_home_set_body().map_err(stage)?;
        let xml = self.client.propfind(principal, &body, 0).await.map_err(stage)?;

        if let Some(home) = parse_property_href(&xml, "calendar-home-set")
            .and_then(|href| resolve_href(principal, &href))
        {
            return Ok(home);
        }

        match self.config.home_fallback(self.client.credentials()) {
            Some(home) => {
                warn!("Principal has no calendar-home-set, using fallback home template");
                Ok(home)
            }
            None => Err(stage(ProviderError::invalid_response(
                "response carried no calendar-home-set href",
            ))),
        }
    }

    /// Lists the calendar collections under `home`.
    ///
    /// Non-calendar collections are dropped. An empty list is not an error.
    ///
    /// # Errors
    ///
    /// Fails at [`DiscoveryStage::List`] on a transport or status error.
    pub async fn list_collections(&self, home: &str) -> Result<Vec<CalendarRef>, SyncError> {
        let stage = |e: ProviderError| SyncError::discovery(DiscoveryStage::List, e);

        debug!("Listing calendar collections");

        let body = propfind_collections_body().map_err(stage)?;
        let xml = self.client.propfind(home, &body, 1).await.map_err(stage)?;

        let collections: Vec<CalendarRef> = parse_collections(&xml)
            .into_iter()
            .filter_map(|c| match resolve_href(home, &c.href) {
                Some(url) => Some(CalendarRef {
                    url,
                    display_name: c.display_name,
                }),
                None => {
                    warn!(href = %c.href, "Skipping collection with unusable href");
                    None
                }
            })
            .collect();

        Ok(collections)
    }

    /// Runs all three steps.
    ///
    /// # Errors
    ///
    /// Returns the first stage error.
    pub async fn discover(&self) -> Result<DiscoverySession, SyncError> {
        let principal_url = self.resolve_principal().await?;
        let calendar_home_url = self.resolve_calendar_home(&principal_url).await?;
        let collections = self.list_collections(&calendar_home_url).await?;

        info!(count = collections.len(), "Discovered calendars");

        Ok(DiscoverySession {
            principal_url,
            calendar_home_url,
            collections,
        })
    }
}
