//! CalDAV request layer.
//!
//! This module wraps a [`DavTransport`] and handles:
//! - Basic authentication on every request
//! - PROPFIND and REPORT methods
//! - A timeout on every call
//! - Mapping response statuses to [`ProviderError`]s

use std::time::Duration;

use tracing::{trace, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::transport::{DavMethod, DavRequest, DavResponse, DavTransport};

use super::auth::Credentials;

/// Authenticated CalDAV client over a borrowed transport.
pub struct CalDavClient<'t> {
    transport: &'t dyn DavTransport,
    credentials: Credentials,
    request_timeout: Duration,
}

impl<'t> CalDavClient<'t> {
    /// Creates a client that bounds every call by `request_timeout`.
    pub fn new(
        transport: &'t dyn DavTransport,
        credentials: Credentials,
        request_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            credentials,
            request_timeout,
        }
    }

    /// Performs a PROPFIND request.
    ///
    /// Used for principal, home and collection discovery.
    pub async fn propfind(&self, url: &str, body: &str, depth: u8) -> ProviderResult<String> {
        self.request(DavMethod::Propfind, url, body, depth).await
    }

    /// Performs a REPORT request.
    ///
    /// Used for calendar-query.
    pub async fn report(&self, url: &str, body: &str) -> ProviderResult<String> {
        self.request(DavMethod::Report, url, body, 1).await
    }

    /// Returns the credentials this client authenticates with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    async fn request(
        &self,
        method: DavMethod,
        url: &str,
        body: &str,
        depth: u8,
    ) -> ProviderResult<String> {
        let request = DavRequest::new(method, url)
            .with_depth(depth)
            .with_body(body)
            .with_authorization(self.credentials.authorization());

        trace!(method = %method, "Sending authenticated request");

        let response = tokio::time::timeout(self.request_timeout, self.transport.send(request))
            .await
            .map_err(|_| {
                ProviderError::timeout(format!(
                    "{} request did not complete within {:?}",
                    method, self.request_timeout
                ))
            })??;

        handle_response(response)
    }
}

/// Checks the response status and extracts the body.
fn handle_response(response: DavResponse) -> ProviderResult<String> {
    let DavResponse { status, body } = response;
    trace!(status, "Received response");

    match status {
        200 | 207 => Ok(body),
        401 => Err(ProviderError::authentication(
            "Authentication failed: invalid credentials",
        )),
        403 => Err(ProviderError::authorization("Access denied to calendar")),
        404 => Err(ProviderError::not_found("Calendar or resource not found")),
        429 => Err(ProviderError::rate_limited("Too many requests to server")),
        s if (500..600).contains(&s) => {
            Err(ProviderError::server(format!("Server error ({}): {}", s, body)))
        }
        s => {
            warn!(status = s, body = %body, "Unexpected response status");
            Err(ProviderError::invalid_response(format!(
                "Unexpected status {}: {}",
                s, body
            )))
        }
    }
}

/// Resolves an href against the URL of the request that returned it.
///
/// Absolute hrefs are returned unchanged; paths take the base's origin.
pub fn resolve_href(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href.trim()).ok().map(String::from)
}
