//! XML utilities for CalDAV WebDAV operations.
//!
//! This module builds the PROPFIND and REPORT bodies the discovery and fetch
//! stages send, and parses the multistatus answers.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use chronotactics_core::TimeWindow;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::error::{ProviderError, ProviderResult};

/// DAV namespace
pub const DAV_NS: &str = "DAV:";
/// CalDAV namespace
pub const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";

/// A collection listed under the calendar home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCollection {
    /// The collection's href, as returned by the server.
    pub href: String,
    /// The display name.
    pub display_name: Option<String>,
}

/// A calendar object returned by a calendar-query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarData {
    /// The object's href.
    pub href: String,
    /// The encoded calendar text.
    pub data: String,
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write(writer: &mut XmlWriter, event: Event<'_>) -> ProviderResult<()> {
    writer
        .write_event(event)
        .map_err(|e| ProviderError::internal(format!("Failed to write XML: {}", e)))
}

fn write_empty_element(writer: &mut XmlWriter, name: &str) -> ProviderResult<()> {
    write(writer, Event::Empty(BytesStart::new(name)))
}

fn new_document() -> ProviderResult<XmlWriter> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;
    Ok(writer)
}

fn finish(writer: XmlWriter) -> ProviderResult<String> {
    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| ProviderError::internal(format!("Generated XML is not UTF-8: {}", e)))
}

/// Generates a PROPFIND body requesting the given properties.
fn propfind_body(props: &[&str]) -> ProviderResult<String> {
    let mut writer = new_document()?;

    // <d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
    let mut propfind = BytesStart::new("d:propfind");
    propfind.push_attribute(("xmlns:d", DAV_NS));
    propfind.push_attribute(("xmlns:c", CALDAV_NS));
    write(&mut writer, Event::Start(propfind))?;

    write(&mut writer, Event::Start(BytesStart::new("d:prop")))?;
    for prop in props {
        write_empty_element(&mut writer, prop)?;
    }
    write(&mut writer, Event::End(BytesEnd::new("d:prop")))?;

    write(&mut writer, Event::End(BytesEnd::new("d:propfind")))?;
    finish(writer)
}

/// PROPFIND body asking for the current user principal.
pub fn propfind_principal_body() -> ProviderResult<String> {
    propfind_body(&["d:current-user-principal"])
}

/// PROPFIND body asking a principal for its calendar home.
pub fn propfind_home_set_body() -> ProviderResult<String> {
    propfind_body(&["c:calendar-home-set"])
}

/// PROPFIND body listing the collections under a calendar home.
pub fn propfind_collections_body() -> ProviderResult<String> {
    propfind_body(&["d:displayname", "d:resourcetype"])
}

/// Generates a REPORT calendar-query body for events inside `window`.
pub fn calendar_query_body(window: TimeWindow) -> ProviderResult<String> {
    let mut writer = new_document()?;

    // <c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
    let mut query = BytesStart::new("c:calendar-query");
    query.push_attribute(("xmlns:d", DAV_NS));
    query.push_attribute(("xmlns:c", CALDAV_NS));
    write(&mut writer, Event::Start(query))?;

    write(&mut writer, Event::Start(BytesStart::new("d:prop")))?;
    write_empty_element(&mut writer, "d:getetag")?;
    write_empty_element(&mut writer, "c:calendar-data")?;
    write(&mut writer, Event::End(BytesEnd::new("d:prop")))?;

    write(&mut writer, Event::Start(BytesStart::new("c:filter")))?;

    let mut vcal_filter = BytesStart::new("c:comp-filter");
    vcal_filter.push_attribute(("name", "VCALENDAR"));
    write(&mut writer, Event::Start(vcal_filter))?;

    let mut vevent_filter = BytesStart::new("c:comp-filter");
    vevent_filter.push_attribute(("name", "VEVENT"));
    write(&mut writer, Event::Start(vevent_filter))?;

    let mut time_range = BytesStart::new("c:time-range");
    time_range.push_attribute(("start", format_icalendar_datetime(window.start).as_str()));
    time_range.push_attribute(("end", format_icalendar_datetime(window.end).as_str()));
    write(&mut writer, Event::Empty(time_range))?;

    write(&mut writer, Event::End(BytesEnd::new("c:comp-filter")))?;
    write(&mut writer, Event::End(BytesEnd::new("c:comp-filter")))?;
    write(&mut writer, Event::End(BytesEnd::new("c:filter")))?;
    write(&mut writer, Event::End(BytesEnd::new("c:calendar-query")))?;

    finish(writer)
}

/// Finds the first href nested inside the named property.
///
/// Returns `None` when the property is absent, empty, holds no href, or the
/// document is malformed before one is found.
pub fn parse_property_href(xml: &str, property: &str) -> Option<String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth_in_property = 0usize;
    let mut in_href = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let local = local_name(&name);

                if local == property {
                    depth_in_property += 1;
                } else if local == "href" && depth_in_property > 0 {
                    in_href = true;
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let local = local_name(&name);

                if local == property {
                    depth_in_property = depth_in_property.saturating_sub(1);
                }
                in_href = false;
            }
            Ok(Event::Text(e)) if in_href => {
                let text = e.unescape().unwrap_or_default().trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    None
}

/// Parses a Depth 1 PROPFIND answer, keeping calendar collections only.
///
/// An entry is a calendar when its `resourcetype` contains a `calendar`
/// element.
pub fn parse_collections(xml: &str) -> Vec<DiscoveredCollection> {
    let mut collections = Vec::new();

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current_href: Option<String> = None;
    let mut current_displayname: Option<String> = None;
    let mut is_calendar = false;
    let mut in_response = false;
    let mut in_resourcetype = false;
    let mut current_element: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match local_name(&name) {
                    "response" => {
                        in_response = true;
                        current_href = None;
                        current_displayname = None;
                        is_calendar = false;
                    }
                    "resourcetype" => in_resourcetype = true,
                    "calendar" if in_resourcetype => is_calendar = true,
                    local @ ("href" | "displayname") => {
                        current_element = Some(local.to_string());
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if local_name(&name) == "calendar" && in_resourcetype {
                    is_calendar = true;
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match local_name(&name) {
                    "response" if in_response => {
                        if is_calendar {
                            if let Some(href) = current_href.take() {
                                collections.push(DiscoveredCollection {
                                    href,
                                    display_name: current_displayname.take(),
                                });
                            }
                        }
                        in_response = false;
                    }
                    "resourcetype" => in_resourcetype = false,
                    _ => {}
                }
                current_element = None;
            }
            Ok(Event::Text(e)) => {
                if let Some(ref elem) = current_element {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match elem.as_str() {
                        "href" if current_href.is_none() => current_href = Some(text),
                        "displayname" => current_displayname = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    collections
}

/// Parses a REPORT answer into the calendar objects it carries.
///
/// Responses without calendar data are skipped.
pub fn parse_report_response(xml: &str) -> Vec<CalendarData> {
    let mut results = Vec::new();

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current_href: Option<String> = None;
    let mut current_data: Option<String> = None;
    let mut in_response = false;
    let mut current_element: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match local_name(&name) {
                    "response" => {
                        in_response = true;
                        current_href = None;
                        current_data = None;
                    }
                    local @ ("href" | "calendar-data") => {
                        current_element = Some(local.to_string());
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if local_name(&name) == "response" && in_response {
                    if let Some(data) = current_data.take() {
                        results.push(CalendarData {
                            href: current_href.take().unwrap_or_default(),
                            data,
                        });
                    }
                    in_response = false;
                }
                current_element = None;
            }
            Ok(Event::Text(e)) => {
                if let Some(ref elem) = current_element {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match elem.as_str() {
                        "href" => current_href = Some(text),
                        "calendar-data" => current_data = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(ref elem) = current_element {
                    let text = String::from_utf8_lossy(&e).to_string();
                    match elem.as_str() {
                        "href" => current_href = Some(text),
                        "calendar-data" => current_data = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    results
}

/// Extracts the local name from a potentially namespaced element name.
fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Formats a datetime for iCalendar time-range filters (UTC format).
fn format_icalendar_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
