//! Colored terminal rendering for fixture types.

use davfixture_core::{EventRecord, SeedFile};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventRecord {
    fn render(&self) -> String {
        let when = format!("{} → {}", self.start_date, self.end_date);
        if self.location.is_empty() {
            format!("{} {}", self.title, when.dimmed())
        } else {
            format!("{} {} {}", self.title, when.dimmed(), format!("@ {}", self.location).dimmed())
        }
    }
}

impl Render for SeedFile {
    fn render(&self) -> String {
        let mut lines = Vec::new();
        for (identity, events) in self.iter() {
            lines.push(format!("👤 {}", identity.bold()));
            for event in events {
                lines.push(format!("   {} {}", "+".green(), event.render()));
            }
        }
        lines.join("\n")
    }
}
