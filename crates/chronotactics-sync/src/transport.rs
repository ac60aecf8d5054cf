//! The HTTP seam between the sync pipeline and the network.
//!
//! [`DavTransport`] sends one WebDAV request and returns the raw status and
//! body. It does not interpret statuses or apply timeouts; the CalDAV client
//! and the orchestrator do that. [`HttpTransport`] is the reqwest-backed
//! implementation.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use reqwest::{Client, Method};
use tracing::trace;

use crate::caldav::CalDavConfig;
use crate::error::{ProviderError, ProviderResult};

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The WebDAV methods the pipeline issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DavMethod {
    /// Reachability probe.
    Options,
    /// Property lookup.
    Propfind,
    /// Calendar query.
    Report,
}

impl DavMethod {
    /// Returns the HTTP method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Options => "OPTIONS",
            Self::Propfind => "PROPFIND",
            Self::Report => "REPORT",
        }
    }
}

impl fmt::Display for DavMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing request.
#[derive(Clone, PartialEq, Eq)]
pub struct DavRequest {
    pub method: DavMethod,
    pub url: String,
    /// Value of the `Depth` header, if any.
    pub depth: Option<u8>,
    /// XML body, sent as `application/xml`.
    pub body: Option<String>,
    /// Value of the `Authorization` header, if any.
    pub authorization: Option<String>,
}

impl DavRequest {
    /// Creates a bare request with no headers or body.
    pub fn new(method: DavMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            depth: None,
            body: None,
            authorization: None,
        }
    }

    /// Sets the `Depth` header.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Sets the XML body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the `Authorization` header.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }
}

impl fmt::Debug for DavRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DavRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("depth", &self.depth)
            .field("body", &self.body.as_ref().map(String::len))
            .field("authorization", &self.authorization.as_ref().map(|_| "***"))
            .finish()
    }
}

/// The raw answer to a [`DavRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResponse {
    pub status: u16,
    pub body: String,
}

impl DavResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends WebDAV requests.
///
/// An `Err` means no HTTP response was received at all. Any status,
/// including 4xx and 5xx, is returned as `Ok`.
pub trait DavTransport: Send + Sync {
    /// Sends one request.
    fn send(&self, request: DavRequest) -> BoxFuture<'_, ProviderResult<DavResponse>>;
}

/// [`DavTransport`] over reqwest.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport using the TLS and user agent settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CalDavConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("Failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client })
    }

    async fn execute(&self, request: DavRequest) -> ProviderResult<DavResponse> {
        let method = Method::from_bytes(request.method.as_str().as_bytes()).map_err(|_| {
            ProviderError::internal(format!("Invalid HTTP method: {}", request.method))
        })?;

        let mut builder = self.client.request(method, &request.url);

        if let Some(d) = request.depth {
            builder = builder.header("Depth", d.to_string());
        }

        if let Some(auth) = request.authorization {
            builder = builder.header("Authorization", auth);
        }

        if let Some(body) = request.body {
            builder = builder
                .header("Content-Type", "application/xml; charset=utf-8")
                .body(body);
        }

        trace!(method = %request.method, "Sending request");

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::timeout(format!("Request timed out: {}", e)).with_source(e)
            } else {
                ProviderError::network(format!("Request failed: {}", e)).with_source(e)
            }
        })?;

        let status = response.status().as_u16();
        trace!(status, "Received response");

        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("Failed to read response: {}", e)).with_source(e)
        })?;

        Ok(DavResponse { status, body })
    }
}

impl DavTransport for HttpTransport {
    fn send(&self, request: DavRequest) -> BoxFuture<'_, ProviderResult<DavResponse>> {
        Box::pin(self.execute(request))
    }
}
