//! Disposable CalDAV fixture servers for calendar integration tests.
//!
//! This crate launches an external CalDAV server (Radicale by default) on a
//! free port, seeds it with calendar events and shuts it down again:
//! - [`FixtureServer`] owns the process and the fixture files
//! - [`FixtureConfig`] describes which binary to run and where its files live
//! - [`EventRecord`] is the fixture data written as iCalendar feeds

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ics;
pub mod port;
pub mod seed;
pub mod server;
pub mod template;

pub use config::FixtureConfig;
pub use error::{FixtureError, FixtureResult};
pub use event::{EventBatch, EventRecord};
pub use seed::SeedFile;
pub use server::{FixtureServer, StartOptions};
