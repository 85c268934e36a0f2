// src/pipeline/lifecycle.rs

//! `Pipeline`: the Idle → Watching → Stopped owner of one monitor and its watcher chain.

use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use crate::errors::{PipelineError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::monitor::{FileSystemMonitor, MonitorOptions};
use crate::pipeline::dispatcher::Dispatcher;
use crate::types::PipelineState;
use crate::watcher::{Watcher, WatcherRegistry};

/// Subdirectory of the base directory that is watched by default.
pub const DEFAULT_WATCH_DIR: &str = "src/main";

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Project directory.
    pub base_dir: PathBuf,
    /// Directory polled by the monitor, relative to `base_dir`.
    pub watch_dir: PathBuf,
    pub monitor: MonitorOptions,
}

impl PipelineOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn watched_root(&self) -> PathBuf {
        self.base_dir.join(&self.watch_dir)
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            watch_dir: PathBuf::from(DEFAULT_WATCH_DIR),
            monitor: MonitorOptions::default(),
        }
    }
}

/// The running monitor lives inside `Watching`; leaving that state consumes it.
enum Lifecycle {
    Idle,
    Watching(FileSystemMonitor),
    Stopped,
}

impl Lifecycle {
    fn state(&self) -> PipelineState {
        match self {
            Lifecycle::Idle => PipelineState::Idle,
            Lifecycle::Watching(_) => PipelineState::Watching,
            Lifecycle::Stopped => PipelineState::Stopped,
        }
    }
}

/// Watches one source tree and feeds every change through the watcher chain.
///
/// `Pipeline` is `Send + Sync`: registration, `watch` and `shutdown` may be
/// called from any thread while the monitor worker dispatches.
pub struct Pipeline {
    fs: Arc<dyn FileSystem>,
    options: PipelineOptions,
    registry: Arc<WatcherRegistry>,
    lifecycle: Mutex<Lifecycle>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self::with_fs(Arc::new(RealFileSystem), options)
    }

    pub fn with_fs(fs: Arc<dyn FileSystem>, options: PipelineOptions) -> Self {
        Self {
            fs,
            options,
            registry: Arc::new(WatcherRegistry::new()),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Build a pipeline whose chain starts out as `watchers`, in order.
    pub fn with_watchers<I>(options: PipelineOptions, watchers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Watcher>>,
    {
        let pipeline = Self::new(options);
        debug!(options = ?pipeline.options, "initializing pipeline with watchers");
        pipeline.registry.replace_all(watchers);
        pipeline
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn base_dir(&self) -> &Path {
        &self.options.base_dir
    }

    pub fn registry(&self) -> &Arc<WatcherRegistry> {
        &self.registry
    }

    pub fn state(&self) -> PipelineState {
        self.lock().state()
    }

    /// Add a watcher at the end of the chain.
    pub fn append(&self, watcher: Arc<dyn Watcher>) -> &Self {
        self.registry.append(watcher);
        self
    }

    /// Replace the whole chain.
    pub fn replace_all<I>(&self, watchers: I) -> &Self
    where
        I: IntoIterator<Item = Arc<dyn Watcher>>,
    {
        self.registry.replace_all(watchers);
        self
    }

    /// Remove the first registration of `watcher`; unknown watchers are ignored.
    pub fn remove(&self, watcher: &Arc<dyn Watcher>) -> &Self {
        self.registry.remove(watcher);
        self
    }

    /// Start the monitor: Idle → Watching.
    ///
    /// Calling this while already watching is a no-op. A start failure is
    /// logged and returned, and the pipeline stays Idle. A stopped pipeline
    /// cannot be restarted.
    pub fn watch(&self) -> Result<&Self> {
        let mut lifecycle = self.lock();
        match &*lifecycle {
            Lifecycle::Watching(_) => {
                warn!(base_dir = ?self.options.base_dir, "pipeline is already watching; ignoring watch()");
                return Ok(self);
            }
            Lifecycle::Stopped => return Err(PipelineError::Terminated),
            Lifecycle::Idle => {}
        }

        let root = self.options.watched_root();
        let mut monitor = FileSystemMonitor::new(
            Arc::clone(&self.fs),
            root.clone(),
            self.options.monitor.clone(),
        );
        let dispatcher = Dispatcher::new(Arc::clone(&self.registry));

        info!(base_dir = %self.options.base_dir.display(), root = %root.display(), "start watching");
        if let Err(err) = monitor.start(move |event| {
            dispatcher.dispatch(&event);
        }) {
            error!(root = %root.display(), error = %err, "cannot start the watcher");
            return Err(err.into());
        }

        *lifecycle = Lifecycle::Watching(monitor);
        Ok(self)
    }

    /// Stop watching: → Stopped.
    ///
    /// Best effort: a failure to stop the monitor is logged, never returned.
    /// Calling this again is a no-op.
    pub fn shutdown(&self) {
        let previous = mem::replace(&mut *self.lock(), Lifecycle::Stopped);

        match previous {
            Lifecycle::Watching(mut monitor) => {
                if let Err(err) = monitor.stop() {
                    error!(error = %err, "failed to stop the watcher");
                }
                info!(base_dir = %self.options.base_dir.display(), "pipeline stopped");
            }
            Lifecycle::Idle => {
                info!("pipeline shut down before it started watching");
            }
            Lifecycle::Stopped => {
                debug!("pipeline already stopped");
            }
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if matches!(self.lock().state(), PipelineState::Watching) {
            self.shutdown();
        }
    }
}
