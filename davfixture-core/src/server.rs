//! Fixture server lifecycle.
//!
//! A [`FixtureServer`] owns one external CalDAV server process:
//!
//! ```text
//! Idle --start--> Running --close--> Stopped
//! ```
//!
//! `start` resolves a port, renders the server config and launches the
//! process. It reports success once the process is launched, not once it
//! accepts connections; use [`FixtureServer::wait_until_listening`] when
//! a test needs the socket. Fixtures are written as one iCalendar file per
//! identity inside the storage root, always as a full snapshot.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::net::Ipv4Addr;
use std::path::{Component, Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{Instant, sleep, timeout};

use crate::config::FixtureConfig;
use crate::error::{FixtureError, FixtureResult};
use crate::event::{EventBatch, EventRecord};
use crate::ics::render_feed;
use crate::port::find_free_port;
use crate::seed::SeedFile;
use crate::template::{Template, TemplateVars};

const POLL_INITIAL_DELAY: Duration = Duration::from_millis(50);
const POLL_MAX_DELAY: Duration = Duration::from_secs(1);

/// Options for [`FixtureServer::start`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StartOptions {
    /// Use this port as-is instead of probing for a free one.
    pub port: Option<u16>,
}

impl StartOptions {
    pub fn with_port(port: u16) -> Self {
        StartOptions { port: Some(port) }
    }
}

enum ServerState {
    Idle,
    Running(Child),
    Stopped,
}

impl ServerState {
    fn require_running(&self, operation: &str) -> FixtureResult<()> {
        match self {
            ServerState::Running(_) => Ok(()),
            ServerState::Idle => Err(FixtureError::InvalidState(format!(
                "{operation} called before start"
            ))),
            ServerState::Stopped => Err(FixtureError::InvalidState(format!(
                "{operation} called after close"
            ))),
        }
    }
}

pub struct FixtureServer {
    config: FixtureConfig,
    template: Template,
    config_path: PathBuf,
    storage_root: PathBuf,
    port: Option<u16>,
    state: ServerState,
    events: BTreeMap<String, Vec<EventRecord>>,
}

impl FixtureServer {
    pub fn new(config: FixtureConfig) -> FixtureResult<Self> {
        let template = match &config.config_template {
            Some(path) => Template::load(path)?,
            None => Template::default(),
        };

        Ok(FixtureServer {
            config_path: config.config_path(),
            storage_root: config.storage_root(),
            config,
            template,
            port: None,
            state: ServerState::Idle,
            events: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Port resolved by the last `start`, if any.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn pid(&self) -> Option<u32> {
        match &self.state {
            ServerState::Running(child) => child.id(),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ServerState::Running(_))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Events accumulated for `identity` since the last clear.
    pub fn events_for(&self, identity: &str) -> &[EventRecord] {
        self.events.get(identity).map(Vec::as_slice).unwrap_or_default()
    }

    /// Storage file backing `identity`.
    pub fn identity_path(&self, identity: &str) -> FixtureResult<PathBuf> {
        validate_identity(identity)?;
        Ok(self.storage_root.join(identity))
    }

    /// Render the server config for `port` without touching the disk.
    pub fn render_config(&self, port: u16) -> FixtureResult<String> {
        let mut vars = TemplateVars::new();
        vars.insert("port", port.to_string());
        vars.insert(
            "filesystem_path",
            self.storage_root.to_string_lossy().into_owned(),
        );
        self.template.render(&vars)
    }

    /// Resolve a port, write the config and launch the server process.
    pub async fn start(&mut self, options: StartOptions) -> FixtureResult<u16> {
        match self.state {
            ServerState::Idle => {}
            ServerState::Running(_) => {
                return Err(FixtureError::InvalidState(
                    "start called while the server is running".into(),
                ));
            }
            ServerState::Stopped => {
                return Err(FixtureError::InvalidState(
                    "start called after close; create a new FixtureServer instead".into(),
                ));
            }
        }

        let port = match options.port {
            Some(port) => port,
            None => timeout(
                self.config.probe_timeout,
                find_free_port(self.config.start_port),
            )
            .await
            .map_err(|_| FixtureError::Timeout("port probe", self.config.probe_timeout))??,
        };
        self.port = Some(port);

        self.write_config(port)?;
        let child = self.spawn()?;

        tracing::info!(
            port,
            pid = child.id(),
            binary = %self.config.server_binary,
            config = %self.config_path.display(),
            "fixture server launched"
        );
        self.state = ServerState::Running(child);

        Ok(port)
    }

    fn write_config(&self, port: u16) -> FixtureResult<()> {
        let rendered = self.render_config(port)?;

        if !self.storage_root.exists() {
            std::fs::create_dir_all(&self.storage_root)?;
        }
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, rendered)?;

        tracing::debug!(path = %self.config_path.display(), "wrote server config");
        Ok(())
    }

    fn spawn(&self) -> FixtureResult<Child> {
        let binary = which::which(&self.config.server_binary).map_err(|e| {
            FixtureError::ProcessSpawn(format!("'{}' not found: {e}", self.config.server_binary))
        })?;

        Command::new(&binary)
            .arg(&self.config.config_flag)
            .arg(&self.config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                FixtureError::ProcessSpawn(format!("Failed to spawn {}: {e}", binary.display()))
            })
    }

    /// Poll until the server accepts TCP connections on its port.
    pub async fn wait_until_listening(&mut self, limit: Duration) -> FixtureResult<()> {
        self.state.require_running("wait_until_listening")?;
        let port = self
            .port
            .ok_or_else(|| FixtureError::InvalidState("running server has no port".into()))?;

        let deadline = Instant::now() + limit;
        let mut delay = POLL_INITIAL_DELAY;

        loop {
            if let ServerState::Running(child) = &mut self.state {
                if let Some(status) = child.try_wait()? {
                    return Err(FixtureError::ProcessExited(format!(
                        "{status} before listening on port {port}"
                    )));
                }
            }

            if TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.is_ok() {
                tracing::debug!(port, "fixture server is listening");
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(FixtureError::Timeout("waiting for the server to listen", limit));
            }

            sleep(delay.min(deadline - now)).await;
            delay = (delay * 2).min(POLL_MAX_DELAY);
        }
    }

    /// Append `events` for `identity` and rewrite its storage file with
    /// every event accumulated for it so far.
    ///
    /// The in-memory list only changes once the file has been written, so a
    /// failed write leaves both untouched.
    pub fn add_event(
        &mut self,
        identity: &str,
        events: impl Into<EventBatch>,
    ) -> FixtureResult<()> {
        self.state.require_running("add_event")?;
        let path = self.identity_path(identity)?;

        let mut updated = self.events_for(identity).to_vec();
        updated.extend(events.into().into_inner());

        let ics = render_feed(identity, &updated)?;
        std::fs::create_dir_all(&self.storage_root)?;
        std::fs::write(&path, ics)?;

        tracing::debug!(
            identity,
            events = updated.len(),
            path = %path.display(),
            "wrote event feed"
        );
        self.events.insert(identity.to_string(), updated);
        Ok(())
    }

    /// Add every identity's events from a seed file.
    pub fn seed(&mut self, seed: &SeedFile) -> FixtureResult<()> {
        for (identity, events) in seed.iter() {
            self.add_event(identity, events)?;
        }
        Ok(())
    }

    /// Forget all events and empty the storage root.
    pub fn remove_all_events(&mut self) -> FixtureResult<()> {
        self.state.require_running("remove_all_events")?;
        self.events.clear();

        let entries = match std::fs::read_dir(&self.storage_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0usize;
        for entry in entries {
            let entry = entry?;
            // Radicale may create its own collection dirs next to our files
            if entry.file_type()?.is_dir() {
                std::fs::remove_dir_all(entry.path())?;
            } else {
                std::fs::remove_file(entry.path())?;
            }
            removed += 1;
        }

        tracing::debug!(removed, "cleared fixture storage");
        Ok(())
    }

    /// Ask the server to terminate and wait for it to exit.
    ///
    /// Resolves only after the OS reports the exit. A server that ignores
    /// the request for longer than `shutdown_timeout` is killed.
    pub async fn close(&mut self) -> FixtureResult<ExitStatus> {
        let child = match &mut self.state {
            ServerState::Running(child) => child,
            ServerState::Idle => {
                return Err(FixtureError::InvalidState("close called before start".into()));
            }
            ServerState::Stopped => {
                return Err(FixtureError::InvalidState("close called twice".into()));
            }
        };
        let pid = child.id();

        let status = match child.try_wait()? {
            Some(status) => status,
            None => {
                request_termination(child)?;
                match timeout(self.config.shutdown_timeout, child.wait()).await {
                    Ok(status) => status?,
                    Err(_) => {
                        tracing::warn!(
                            pid,
                            timeout = ?self.config.shutdown_timeout,
                            "fixture server ignored termination request, killing"
                        );
                        child.kill().await?;
                        child.wait().await?
                    }
                }
            }
        };

        self.state = ServerState::Stopped;
        tracing::info!(pid, %status, "fixture server stopped");
        Ok(status)
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> FixtureResult<()> {
    // No pid means the child was already reaped
    let Some(pid) = child.id() else {
        return Ok(());
    };

    // SAFETY: kill(2) has no memory-safety preconditions; pid is our unreaped child
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> FixtureResult<()> {
    child.start_kill()?;
    Ok(())
}

fn validate_identity(identity: &str) -> FixtureResult<()> {
    let mut components = Path::new(identity).components();
    let single_normal = matches!(
        components.next(),
        Some(Component::Normal(name)) if name == OsStr::new(identity)
    ) && components.next().is_none();

    if single_normal && !identity.contains(['/', '\\']) {
        Ok(())
    } else {
        Err(FixtureError::InvalidIdentity(identity.to_string()))
    }
}
