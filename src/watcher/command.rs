// src/watcher/command.rs

//! Watcher that runs a shell command for every matching event.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use super::contract::{Propagation, WatchFailure, WatchResult, Watcher};
use super::patterns::PathFilter;
use crate::types::FileEventKind;

/// Environment variable carrying the event kind (`create|update|delete`).
pub const ENV_EVENT: &str = "WATCHPIPE_EVENT";
/// Environment variable carrying the absolute path of the changed file.
pub const ENV_FILE: &str = "WATCHPIPE_FILE";
/// Environment variable carrying the watched root directory.
pub const ENV_ROOT: &str = "WATCHPIPE_ROOT";

#[derive(Debug, Clone)]
pub struct CommandWatcher {
    name: String,
    cmd: String,
    filter: PathFilter,
    events: Vec<FileEventKind>,
    propagate: bool,
}

impl CommandWatcher {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>, filter: PathFilter) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            filter,
            events: FileEventKind::ALL.to_vec(),
            propagate: true,
        }
    }

    /// Only run for these event kinds; others pass through untouched.
    pub fn with_events(mut self, events: impl IntoIterator<Item = FileEventKind>) -> Self {
        self.events = events.into_iter().collect();
        self
    }

    /// Whether a successful run lets the event continue down the chain.
    pub fn with_propagate(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn events(&self) -> &[FileEventKind] {
        &self.events
    }

    pub fn propagate(&self) -> bool {
        self.propagate
    }

    pub fn root(&self) -> &Path {
        self.filter.root()
    }

    fn run(&self, kind: FileEventKind, path: &Path) -> WatchResult {
        if !self.events.contains(&kind) {
            debug!(watcher = %self.name, %kind, ?path, "event kind not subscribed; passing through");
            return Ok(Propagation::Continue);
        }

        info!(watcher = %self.name, %kind, ?path, cmd = %self.cmd, "running command");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.env(ENV_EVENT, kind.as_str())
            .env(ENV_FILE, path)
            .env(ENV_ROOT, self.root())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = cmd.status().map_err(|e| {
            WatchFailure::with_source(format!("failed to spawn `{}`", self.cmd), e)
        })?;

        if status.success() {
            debug!(watcher = %self.name, "command succeeded");
            Ok(Propagation::from_continue_flag(self.propagate))
        } else {
            let code = status.code().unwrap_or(-1);
            warn!(watcher = %self.name, exit_code = code, "command failed");
            Err(WatchFailure::new(format!(
                "`{}` exited with status {code} for {}",
                self.cmd,
                path.display()
            )))
        }
    }
}

impl Watcher for CommandWatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn accept(&self, path: &Path) -> bool {
        self.filter.matches(path)
    }

    fn on_create(&self, path: &Path) -> WatchResult {
        self.run(FileEventKind::Create, path)
    }

    fn on_update(&self, path: &Path) -> WatchResult {
        self.run(FileEventKind::Update, path)
    }

    fn on_delete(&self, path: &Path) -> WatchResult {
        self.run(FileEventKind::Delete, path)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn watcher(cmd: &str) -> CommandWatcher {
        let filter = PathFilter::new("/project", &["**/*.txt".to_string()], &[]).unwrap();
        CommandWatcher::new("test", cmd, filter)
    }

    #[test]
    fn successful_command_continues_by_default() {
        let w = watcher("true");
        let result = w.on_update(Path::new("/project/a.txt"));
        assert_eq!(result.unwrap(), Propagation::Continue);
    }

    #[test]
    fn non_propagating_command_stops_chain() {
        let w = watcher("true").with_propagate(false);
        let result = w.on_create(Path::new("/project/a.txt"));
        assert_eq!(result.unwrap(), Propagation::Stop);
    }

    #[test]
    fn failing_command_is_a_watch_failure() {
        let w = watcher("exit 3");
        let err = w.on_create(Path::new("/project/a.txt")).unwrap_err();
        assert!(err.message().contains("status 3"));
    }

    #[test]
    fn unsubscribed_kind_does_not_run_command() {
        let w = watcher("exit 1").with_events([FileEventKind::Create]);
        let result = w.on_delete(Path::new("/project/a.txt"));
        assert_eq!(result.unwrap(), Propagation::Continue);
    }

    #[test]
    fn command_sees_event_environment() {
        let w = watcher(r#"test "$WATCHPIPE_EVENT" = update && test "$WATCHPIPE_FILE" = /project/a.txt"#);
        let result = w.on_update(Path::new("/project/a.txt"));
        assert!(result.is_ok());
    }

    #[test]
    fn accept_uses_globs() {
        let w = watcher("true");
        assert!(w.accept(Path::new("/project/docs/a.txt")));
        assert!(!w.accept(Path::new("/project/docs/a.md")));
    }
}
