//! Minimal `{{ name }}` templates for server configuration files.
//!
//! Rendering is pure substitution: there are no loops or conditionals.
//! Every placeholder must be supplied, so a typo in a template fails
//! loudly instead of producing a config the server silently misreads.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{FixtureError, FixtureResult};

/// Radicale configuration used when no `config_template` is configured.
pub const DEFAULT_CONFIG_TEMPLATE: &str = "\
[server]
hosts = 127.0.0.1:{{ port }}
daemon = False
ssl = False

[encoding]
request = utf-8
stock = utf-8

[auth]
type = None

[rights]
type = None

[storage]
type = filesystem
filesystem_folder = {{ filesystem_path }}

[logging]
debug = False
";

/// Values substituted into a [`Template`].
pub type TemplateVars = BTreeMap<&'static str, String>;

#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Template {
            source: source.into(),
        }
    }

    /// Read a template from disk.
    pub fn load(path: &Path) -> FixtureResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            FixtureError::Template(format!("Could not read {}: {e}", path.display()))
        })?;
        Ok(Template::new(source))
    }

    /// Substitute every `{{ name }}` placeholder with its value from `vars`.
    pub fn render(&self, vars: &TemplateVars) -> FixtureResult<String> {
        let mut output = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(open) = rest.find("{{") {
            output.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];

            let close = after_open.find("}}").ok_or_else(|| {
                FixtureError::Template(format!(
                    "Unterminated placeholder at byte {}",
                    self.source.len() - rest.len() + open
                ))
            })?;

            let name = after_open[..close].trim();
            let value = vars
                .get(name)
                .ok_or_else(|| FixtureError::Template(format!("Unknown placeholder '{name}'")))?;
            output.push_str(value);

            rest = &after_open[close + 2..];
        }

        output.push_str(rest);
        Ok(output)
    }
}

impl Default for Template {
    fn default() -> Self {
        Template::new(DEFAULT_CONFIG_TEMPLATE)
    }
}
