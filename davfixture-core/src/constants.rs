use std::time::Duration;

/// First port tried when no fixed port is requested.
pub const DEFAULT_START_PORT: u16 = 50000;

/// External CalDAV server launched by default.
pub const DEFAULT_SERVER_BINARY: &str = "radicale";

/// Flag used to hand the generated config file to the server.
pub const DEFAULT_CONFIG_FLAG: &str = "--config";

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the generated config file inside the work dir.
pub const CONFIG_FILE_NAME: &str = "config";

/// Directory inside the work dir that the server reads collections from.
pub const STORAGE_DIR_NAME: &str = "collections";

pub const LOCAL_CONFIG_FILE: &str = "davfixture.toml";
pub const ENV_PREFIX: &str = "DAVFIXTURE";
