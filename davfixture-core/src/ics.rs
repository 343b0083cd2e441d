//! Event feed rendering.
//!
//! Each identity's storage file is a single VCALENDAR holding every
//! accumulated record as its own VEVENT, in insertion order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use crate::error::FixtureResult;
use crate::event::EventRecord;

const PRODID: &str = "-//davfixture//EN";

/// A fixture date string, normalised to its iCalendar form when it parses.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FeedTime {
    Date(NaiveDate),
    Utc(DateTime<Utc>),
    Floating(NaiveDateTime),
    /// Anything unrecognised is written verbatim.
    Raw(String),
}

impl FeedTime {
    fn parse(value: &str) -> Self {
        let value = value.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return FeedTime::Utc(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
                return FeedTime::Floating(dt);
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return FeedTime::Date(d);
        }

        FeedTime::Raw(value.to_string())
    }
}

/// Render the full feed for one identity.
pub fn render_feed(identity: &str, events: &[EventRecord]) -> FixtureResult<String> {
    let mut cal = Calendar::new();
    cal.name(identity);

    // DTSTAMP is required by RFC 5545; one stamp per snapshot
    let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

    for (index, record) in events.iter().enumerate() {
        let mut ics_event = icalendar::Event::new();

        let uid = record
            .uid
            .clone()
            .unwrap_or_else(|| format!("{identity}-{}@davfixture", index + 1));
        ics_event.uid(&uid);
        ics_event.add_property("DTSTAMP", &dtstamp);
        ics_event.summary(&record.title);

        add_datetime_property(&mut ics_event, "DTSTART", &FeedTime::parse(&record.start_date));
        add_datetime_property(&mut ics_event, "DTEND", &FeedTime::parse(&record.end_date));

        if !record.location.is_empty() {
            ics_event.location(&record.location);
        }
        if !record.description.is_empty() {
            ics_event.description(&record.description);
        }

        cal.push(ics_event.done());
    }

    let cal = cal.done();
    Ok(strip_ics_bloat(&cal.to_string()))
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with our own identifier
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

fn add_datetime_property(ics_event: &mut icalendar::Event, name: &str, time: &FeedTime) {
    match time {
        FeedTime::Date(d) => {
            let mut prop = Property::new(name, d.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
        FeedTime::Utc(dt) => {
            ics_event.add_property(name, dt.format("%Y%m%dT%H%M%SZ").to_string());
        }
        FeedTime::Floating(dt) => {
            ics_event.add_property(name, dt.format("%Y%m%dT%H%M%S").to_string());
        }
        FeedTime::Raw(raw) => {
            ics_event.add_property(name, raw.as_str());
        }
    }
}
