// src/monitor/poller.rs

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::anyhow;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, error, info, warn};

use crate::errors::MonitorError;
use crate::fs::FileSystem;
use crate::monitor::snapshot::Snapshot;
use crate::types::{DetectionMode, FileEvent};

/// Default period between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Name given to the background polling thread.
pub const WORKER_NAME: &str = "watchpipe-monitor";

#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub interval: Duration,
    pub detection: DetectionMode,
    pub worker_name: String,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            detection: DetectionMode::default(),
            worker_name: WORKER_NAME.to_string(),
        }
    }
}

struct Worker {
    stop_tx: Sender<()>,
    join: JoinHandle<()>,
}

/// Polls one directory subtree on a fixed interval and reports the delta
/// between consecutive snapshots.
///
/// At most one worker thread runs per monitor. Events are delivered to the
/// callback passed to [`start`](Self::start), on that worker, one at a time
/// in detection order.
pub struct FileSystemMonitor {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    options: MonitorOptions,
    worker: Option<Worker>,
}

impl fmt::Debug for FileSystemMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystemMonitor")
            .field("root", &self.root)
            .field("options", &self.options)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl FileSystemMonitor {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>, options: MonitorOptions) -> Self {
        Self {
            fs,
            root: root.into(),
            options,
            worker: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Take the initial snapshot and spawn the polling worker.
    ///
    /// Files already present when this returns never produce a `Created`
    /// event. Fails if the root is not an accessible directory or the
    /// monitor is already running.
    pub fn start<F>(&mut self, on_event: F) -> Result<(), MonitorError>
    where
        F: FnMut(FileEvent) + Send + 'static,
    {
        if self.worker.is_some() {
            return Err(MonitorError::AlreadyStarted);
        }

        let root = self
            .fs
            .canonicalize(&self.root)
            .map_err(|source| MonitorError::RootUnavailable {
                path: self.root.clone(),
                source,
            })?;
        if !self.fs.is_dir(&root) {
            return Err(MonitorError::RootUnavailable {
                path: root,
                source: anyhow!("not a directory"),
            });
        }

        let initial = Snapshot::scan(self.fs.as_ref(), &root, self.options.detection, None)
            .map_err(|err| MonitorError::RootUnavailable {
                path: root.clone(),
                source: err.into(),
            })?;
        debug!(?root, files = initial.len(), "initial snapshot taken");

        self.root = root.clone();
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let poll = PollLoop {
            fs: Arc::clone(&self.fs),
            root,
            options: self.options.clone(),
            current: initial,
            stop_rx,
        };

        let worker_name = self.options.worker_name.clone();
        let join = thread::Builder::new()
            .name(worker_name.clone())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| poll.run(on_event)));
                if let Err(payload) = outcome {
                    error!(worker = %worker_name, "monitor worker panicked; polling stopped");
                    panic::resume_unwind(payload);
                }
            })
            .map_err(MonitorError::SpawnFailed)?;

        info!(root = ?self.root, interval_ms = self.options.interval.as_millis() as u64, "monitor started");
        self.worker = Some(Worker { stop_tx, join });
        Ok(())
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// A no-op if the monitor is not running. When called from the worker
    /// itself (a watcher stopping its own pipeline) the worker is signalled
    /// but not joined; it exits after the current event.
    pub fn stop(&mut self) -> Result<(), MonitorError> {
        let Some(worker) = self.worker.take() else {
            debug!("monitor not running; nothing to stop");
            return Ok(());
        };

        // Full channel means a stop is already pending; disconnected means
        // the worker is gone. Both are fine.
        let _ = worker.stop_tx.try_send(());

        if worker.join.thread().id() == thread::current().id() {
            debug!("stop requested from the monitor worker; not joining");
            return Ok(());
        }

        let worker_name = worker
            .join
            .thread()
            .name()
            .unwrap_or(WORKER_NAME)
            .to_string();
        match worker.join.join() {
            Ok(()) => {
                info!(worker = %worker_name, "monitor stopped");
                Ok(())
            }
            Err(_) => Err(MonitorError::WorkerPanicked {
                worker: worker_name,
            }),
        }
    }
}

impl Drop for FileSystemMonitor {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(error = %err, "monitor did not stop cleanly");
        }
    }
}

struct PollLoop {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    options: MonitorOptions,
    current: Snapshot,
    stop_rx: Receiver<()>,
}

impl PollLoop {
    fn run<F>(mut self, mut on_event: F)
    where
        F: FnMut(FileEvent),
    {
        debug!(worker = %self.options.worker_name, "poll loop running");

        loop {
            match self.stop_rx.recv_timeout(self.options.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }

            let Some(next) = self.poll() else {
                continue;
            };
            let events = self.current.diff(&next);
            self.current = next;

            for event in events {
                if self.stop_requested() {
                    debug!(worker = %self.options.worker_name, "stop requested; dropping remaining events");
                    return;
                }
                on_event(event);
            }
        }

        debug!(worker = %self.options.worker_name, "poll loop finished");
    }

    /// Take the next snapshot. `None` means the poll is skipped.
    fn poll(&self) -> Option<Snapshot> {
        // A vanished root reports everything it contained as deleted.
        if !self.fs.exists(&self.root) {
            if !self.current.is_empty() {
                warn!(worker = %self.options.worker_name, root = ?self.root, "watched root disappeared");
            }
            return Some(Snapshot::new());
        }

        match Snapshot::scan(
            self.fs.as_ref(),
            &self.root,
            self.options.detection,
            Some(&self.current),
        ) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                error!(
                    worker = %self.options.worker_name,
                    error = %err,
                    "poll failed; keeping previous snapshot"
                );
                None
            }
        }
    }

    fn stop_requested(&self) -> bool {
        !matches!(self.stop_rx.try_recv(), Err(TryRecvError::Empty))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant;

    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn fast() -> MonitorOptions {
        MonitorOptions {
            interval: Duration::from_millis(10),
            ..MonitorOptions::default()
        }
    }

    fn wait_for<F: Fn() -> bool>(cond: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn start_fails_for_missing_root() {
        let fs = Arc::new(MockFileSystem::new());
        let mut monitor = FileSystemMonitor::new(fs, "/nowhere", fast());

        let err = monitor.start(|_| {}).unwrap_err();
        assert!(matches!(err, MonitorError::RootUnavailable { .. }));
        assert!(!monitor.is_running());
    }

    #[test]
    fn second_start_is_rejected() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_dir("/p");
        let mut monitor = FileSystemMonitor::new(fs, "/p", fast());

        monitor.start(|_| {}).unwrap();
        assert!(matches!(monitor.start(|_| {}), Err(MonitorError::AlreadyStarted)));
        monitor.stop().unwrap();
    }

    #[test]
    fn stop_is_a_noop_when_not_running() {
        let fs = Arc::new(MockFileSystem::new());
        let mut monitor = FileSystemMonitor::new(fs, "/p", fast());
        monitor.stop().unwrap();
        monitor.stop().unwrap();
    }

    #[test]
    fn existing_files_do_not_produce_events() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/existing", "x");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut monitor = FileSystemMonitor::new(fs.clone(), "/p", fast());
        let sink = Arc::clone(&seen);
        monitor
            .start(move |e| sink.lock().unwrap().push(e))
            .unwrap();

        fs.add_file("/p/new", "y");
        assert!(wait_for(|| !seen.lock().unwrap().is_empty()));
        monitor.stop().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![FileEvent::created("/p/new")]);
    }

    #[test]
    fn vanished_root_reports_deletions() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/a", "a");
        fs.add_file("/p/b", "b");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut monitor = FileSystemMonitor::new(fs.clone(), "/p", fast());
        let sink = Arc::clone(&seen);
        monitor
            .start(move |e| sink.lock().unwrap().push(e))
            .unwrap();

        fs.remove("/p");
        assert!(wait_for(|| seen.lock().unwrap().len() == 2));
        monitor.stop().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![FileEvent::deleted("/p/a"), FileEvent::deleted("/p/b")]
        );
    }

    #[test]
    fn worker_thread_is_named() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_dir("/p");
        let names = Arc::new(Mutex::new(Vec::new()));

        let mut monitor = FileSystemMonitor::new(fs.clone(), "/p", fast());
        let sink = Arc::clone(&names);
        monitor
            .start(move |_| {
                let name = thread::current().name().map(str::to_string);
                sink.lock().unwrap().push(name);
            })
            .unwrap();

        fs.add_file("/p/x", "x");
        assert!(wait_for(|| !names.lock().unwrap().is_empty()));
        monitor.stop().unwrap();

        assert_eq!(names.lock().unwrap()[0].as_deref(), Some(WORKER_NAME));
    }
}
