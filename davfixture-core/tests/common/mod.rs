//! Fake CalDAV servers for exercising the lifecycle without Radicale.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use davfixture_core::FixtureConfig;
use tempfile::TempDir;

const INITIAL_DELAY_MS: u64 = 10;
const MAX_DELAY_MS: u64 = 200;

/// A temp work dir plus a `bin/` directory for fake server scripts.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::create_dir_all(dir.path().join("bin")).expect("create bin dir");
        Sandbox { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn invocation_path(&self) -> PathBuf {
        self.path().join("invocation")
    }

    /// Write an executable shell script into `bin/`.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path().join("bin").join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
        path
    }

    /// Records its arguments, then sleeps until terminated.
    pub fn sleeper(&self) -> PathBuf {
        let body = format!(
            "printf '%s\\n' \"$@\" > '{}'\nexec sleep 60",
            self.invocation_path().display()
        );
        self.script("sleeper", &body)
    }

    /// Ignores SIGTERM and has to be killed.
    pub fn stubborn(&self) -> PathBuf {
        self.script("stubborn", "trap '' TERM\nwhile true; do sleep 1; done")
    }

    /// Exits immediately with status 3.
    pub fn crasher(&self) -> PathBuf {
        self.script("crasher", "exit 3")
    }

    pub fn config(&self, binary: &Path) -> FixtureConfig {
        FixtureConfig::default()
            .with_work_dir(self.path())
            .with_server_binary(binary.to_string_lossy())
    }

    /// Arguments the sleeper was started with, one per line.
    pub fn invocation(&self) -> Option<String> {
        wait_for_file(&self.invocation_path(), Duration::from_secs(5))
    }
}

/// Poll until `path` exists with non-empty content, backing off exponentially.
pub fn wait_for_file(path: &Path, timeout: Duration) -> Option<String> {
    let start = Instant::now();
    let mut delay = Duration::from_millis(INITIAL_DELAY_MS);

    loop {
        if let Ok(content) = fs::read_to_string(path) {
            if !content.is_empty() {
                return Some(content);
            }
        }
        if start.elapsed() >= timeout {
            return None;
        }
        std::thread::sleep(delay);
        delay = (delay * 2).min(Duration::from_millis(MAX_DELAY_MS));
    }
}

pub fn process_is_running(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

/// Entries currently in a directory, sorted.
pub fn list_dir(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(path)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
