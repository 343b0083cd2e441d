//! Calendar fixture records.
//!
//! Records are opaque: the manager never validates them, it only hands
//! them to the feed renderer. Dates stay strings so fixtures can use
//! whatever form the test finds convenient.

use serde::{Deserialize, Serialize};

/// A single calendar event to seed into the fixture server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(alias = "startDate")]
    pub start_date: String,
    #[serde(alias = "endDate")]
    pub end_date: String,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    /// Stable UID for the VEVENT; derived from identity and position when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl EventRecord {
    pub fn new(
        title: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        EventRecord {
            start_date: start_date.into(),
            end_date: end_date.into(),
            title: title.into(),
            location: String::new(),
            description: String::new(),
            uid: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }
}

/// One record or an ordered sequence of them, as accepted by
/// [`FixtureServer::add_event`](crate::FixtureServer::add_event).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBatch(Vec<EventRecord>);

impl EventBatch {
    pub fn into_inner(self) -> Vec<EventRecord> {
        self.0
    }
}

impl From<EventRecord> for EventBatch {
    fn from(event: EventRecord) -> Self {
        EventBatch(vec![event])
    }
}

impl From<Vec<EventRecord>> for EventBatch {
    fn from(events: Vec<EventRecord>) -> Self {
        EventBatch(events)
    }
}

impl From<&[EventRecord]> for EventBatch {
    fn from(events: &[EventRecord]) -> Self {
        EventBatch(events.to_vec())
    }
}

impl<const N: usize> From<[EventRecord; N]> for EventBatch {
    fn from(events: [EventRecord; N]) -> Self {
        EventBatch(events.into())
    }
}
