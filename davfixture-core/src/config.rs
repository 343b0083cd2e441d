//! Fixture server configuration.
//!
//! Layered with the `config` crate, later sources winning:
//! built-in defaults, `~/.config/davfixture/config.toml`,
//! `./davfixture.toml`, then `DAVFIXTURE_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_CONFIG_FLAG, DEFAULT_PROBE_TIMEOUT, DEFAULT_SERVER_BINARY,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_START_PORT, ENV_PREFIX, LOCAL_CONFIG_FILE,
    STORAGE_DIR_NAME,
};
use crate::error::{FixtureError, FixtureResult};

fn default_server_binary() -> String {
    DEFAULT_SERVER_BINARY.to_string()
}

fn default_config_flag() -> String {
    DEFAULT_CONFIG_FLAG.to_string()
}

fn default_start_port() -> u16 {
    DEFAULT_START_PORT
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("davfixture")
}

fn default_probe_timeout() -> Duration {
    DEFAULT_PROBE_TIMEOUT
}

fn default_shutdown_timeout() -> Duration {
    DEFAULT_SHUTDOWN_TIMEOUT
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureConfig {
    /// Server executable, looked up in PATH unless it is a path.
    #[serde(default = "default_server_binary")]
    pub server_binary: String,

    #[serde(default = "default_config_flag")]
    pub config_flag: String,

    /// First port probed when `start` is not given a fixed port.
    #[serde(default = "default_start_port")]
    pub start_port: u16,

    /// Holds the generated config file and the storage root. `~` is expanded.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Override for the built-in Radicale config template.
    #[serde(default)]
    pub config_template: Option<PathBuf>,

    #[serde(
        default = "default_probe_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub probe_timeout: Duration,

    /// How long to wait after SIGTERM before killing the server.
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        FixtureConfig {
            server_binary: default_server_binary(),
            config_flag: default_config_flag(),
            start_port: default_start_port(),
            work_dir: default_work_dir(),
            config_template: None,
            probe_timeout: default_probe_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl FixtureConfig {
    /// User-level config at ~/.config/davfixture/config.toml
    pub fn user_config_path() -> FixtureResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FixtureError::Config("Could not determine config directory".into()))?
            .join("davfixture");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the standard locations and the environment.
    pub fn load() -> FixtureResult<Self> {
        let mut builder = Config::builder();

        if let Ok(user_path) = Self::user_config_path() {
            builder = builder.add_source(File::from(user_path).required(false));
        }

        let config = builder
            .add_source(File::from(Path::new(LOCAL_CONFIG_FILE)).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| FixtureError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| FixtureError::Config(e.to_string()))
    }

    /// Load from a single explicit file, ignoring the standard locations.
    pub fn load_from_file(path: &Path) -> FixtureResult<Self> {
        Config::builder()
            .add_source(File::from(path))
            .build()
            .map_err(|e| FixtureError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| FixtureError::Config(e.to_string()))
    }

    pub fn with_server_binary(mut self, binary: impl Into<String>) -> Self {
        self.server_binary = binary.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_start_port(mut self, port: u16) -> Self {
        self.start_port = port;
        self
    }

    pub fn with_config_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_template = Some(path.into());
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Work dir with `~` expanded.
    pub fn work_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.work_dir.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }

    pub fn config_path(&self) -> PathBuf {
        self.work_path().join(CONFIG_FILE_NAME)
    }

    pub fn storage_root(&self) -> PathBuf {
        self.work_path().join(STORAGE_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = FixtureConfig::default();
        assert_eq!(config.server_binary, "radicale");
        assert_eq!(config.config_flag, "--config");
        assert_eq!(config.start_port, 50000);
        assert!(config.config_template.is_none());
        assert_eq!(config.config_path(), config.work_path().join("config"));
        assert_eq!(config.storage_root(), config.work_path().join("collections"));
    }

    #[test]
    fn test_load_from_file_with_partial_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("davfixture.toml");
        std::fs::write(
            &path,
            "server_binary = \"/opt/radicale/bin/radicale\"\n\
             start_port = 51000\n\
             shutdown_timeout = \"250ms\"\n",
        )
        .unwrap();

        let config = FixtureConfig::load_from_file(&path).unwrap();
        assert_eq!(config.server_binary, "/opt/radicale/bin/radicale");
        assert_eq!(config.start_port, 51000);
        assert_eq!(config.shutdown_timeout, Duration::from_millis(250));
        assert_eq!(config.probe_timeout, DEFAULT_PROBE_TIMEOUT);
        assert_eq!(config.config_flag, "--config");
    }

    #[test]
    fn test_load_from_file_rejects_bad_duration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("davfixture.toml");
        std::fs::write(&path, "probe_timeout = \"soon\"\n").unwrap();

        let err = FixtureConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, FixtureError::Config(_)));
    }

    #[test]
    fn test_work_dir_tilde_is_expanded() {
        let config = FixtureConfig::default().with_work_dir("~/fixtures");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.work_path(), home.join("fixtures"));
        }
    }
}
