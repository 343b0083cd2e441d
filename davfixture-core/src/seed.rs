//! Seed files: fixtures for several identities in one document.
//!
//! ```toml
//! [[alice]]
//! title = "Standup"
//! start_date = "2024-01-01T09:00"
//! end_date = "2024-01-01T09:30"
//! location = "Room1"
//! ```
//!
//! JSON uses the same shape: `{ "alice": [ { "title": ... } ] }`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{FixtureError, FixtureResult};
use crate::event::EventRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SeedFile {
    pub identities: BTreeMap<String, Vec<EventRecord>>,
}

impl SeedFile {
    /// Read a seed file; `.toml` files are parsed as TOML, everything else as JSON.
    pub fn load(path: &Path) -> FixtureResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path.extension().is_some_and(|e| e == "toml");

        let seed = if is_toml {
            toml::from_str(&content).map_err(|e| {
                FixtureError::Serialization(format!("{}: {e}", path.display()))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                FixtureError::Serialization(format!("{}: {e}", path.display()))
            })?
        };

        Ok(seed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EventRecord])> {
        self.identities
            .iter()
            .map(|(identity, events)| (identity.as_str(), events.as_slice()))
    }

    pub fn event_count(&self) -> usize {
        self.identities.values().map(Vec::len).sum()
    }
}
