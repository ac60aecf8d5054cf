//! Test doubles for the transport seam.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::error::{ProviderError, ProviderResult};
use crate::transport::{BoxFuture, DavMethod, DavRequest, DavResponse, DavTransport};

enum Reply {
    Respond(u16, String),
    Fail,
    Stall(Duration),
}

struct Route {
    method: DavMethod,
    url: String,
    reply: Reply,
}

/// A transport that answers from a fixed script and records what it was sent.
///
/// Unscripted requests get a 404.
pub(crate) struct ScriptedTransport {
    routes: Vec<Route>,
    sent: Mutex<Vec<DavRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Answers `method url` with `status` and `body`.
    pub fn respond(
        mut self,
        method: DavMethod,
        url: &str,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.routes.push(Route {
            method,
            url: url.to_string(),
            reply: Reply::Respond(status, body.into()),
        });
        self
    }

    /// Fails `method url` without a response.
    pub fn fail(mut self, method: DavMethod, url: &str) -> Self {
        self.routes.push(Route {
            method,
            url: url.to_string(),
            reply: Reply::Fail,
        });
        self
    }

    /// Answers `method url` with an empty 200 after `delay`.
    pub fn stall(mut self, method: DavMethod, url: &str, delay: Duration) -> Self {
        self.routes.push(Route {
            method,
            url: url.to_string(),
            reply: Reply::Stall(delay),
        });
        self
    }

    /// Returns every request sent so far.
    pub fn requests(&self) -> Vec<DavRequest> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Returns the URLs requested with `method`.
    pub fn urls(&self, method: DavMethod) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .map(|r| r.url)
            .collect()
    }
}

impl DavTransport for ScriptedTransport {
    fn send(&self, request: DavRequest) -> BoxFuture<'_, ProviderResult<DavResponse>> {
        Box::pin(async move {
            let route = self
                .routes
                .iter()
                .find(|r| r.method == request.method && r.url == request.url);

            if let Ok(mut sent) = self.sent.lock() {
                sent.push(request.clone());
            }

            match route.map(|r| &r.reply) {
                Some(Reply::Respond(status, body)) => Ok(DavResponse::new(*status, body.clone())),
                Some(Reply::Fail) => Err(ProviderError::network(format!(
                    "connection refused: {}",
                    request.url
                ))),
                Some(Reply::Stall(delay)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(DavResponse::new(200, ""))
                }
                None => Ok(DavResponse::new(404, "")),
            }
        })
    }
}

/// A multistatus body carrying one href-valued property.
pub(crate) fn property_href_response(property: &str, href: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<multistatus xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <response>
    <href>/</href>
    <propstat>
      <prop>
        <{property}><href>{href}</href></{property}>
      </prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
</multistatus>"#
    )
}

/// A Depth 1 listing. Each entry is `(href, display name, is calendar)`.
pub(crate) fn collections_response(entries: &[(&str, &str, bool)]) -> String {
    let responses: String = entries
        .iter()
        .map(|(href, name, is_calendar)| {
            let kind = if *is_calendar {
                "<collection/><C:calendar/>"
            } else {
                "<collection/>"
            };
            format!(
                "<response><href>{href}</href><propstat><prop><displayname>{name}</displayname>\
                 <resourcetype>{kind}</resourcetype></prop>\
                 <status>HTTP/1.1 200 OK</status></propstat></response>"
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><multistatus xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">{responses}</multistatus>"#
    )
}

/// A calendar-query answer carrying one object per ICS text.
pub(crate) fn report_response(objects: &[&str]) -> String {
    let responses: String = objects
        .iter()
        .enumerate()
        .map(|(i, ics)| {
            format!(
                "<response><href>/cal/{i}.ics</href><propstat><prop>\
                 <getetag>\"{i}\"</getetag><C:calendar-data>{ics}</C:calendar-data>\
                 </prop><status>HTTP/1.1 200 OK</status></propstat></response>"
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><multistatus xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">{responses}</multistatus>"#
    )
}

/// A minimal calendar object with UTC times.
pub(crate) fn ics_event(uid: &str, summary: &str, start: &str, end: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Test//EN\nBEGIN:VEVENT\nUID:{uid}\n\
         DTSTAMP:20240101T000000Z\nDTSTART:{start}\nDTEND:{end}\nSUMMARY:{summary}\n\
         END:VEVENT\nEND:VCALENDAR\n"
    )
}

/// Formatted log output collected by [`capture_logs`].
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Records every event at every level on the current thread until the guard
/// is dropped.
pub(crate) fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}
