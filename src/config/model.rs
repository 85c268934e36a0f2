// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::monitor::DEFAULT_POLL_INTERVAL;
use crate::pipeline::DEFAULT_WATCH_DIR;
use crate::types::{DetectionMode, FileEventKind};

/// Top-level configuration exactly as read from a TOML file.
///
/// ```toml
/// [pipeline]
/// watch_dir = "src/main"
/// interval_ms = 2000
/// detection = "metadata"
///
/// [[watcher]]
/// name = "less"
/// cmd = "lessc $WATCHPIPE_FILE"
/// watch = ["**/*.less"]
/// events = ["create", "update"]
/// ```
///
/// All sections are optional and have reasonable defaults. Use
/// [`ConfigFile::try_from`] to obtain a validated config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// `[pipeline]` section.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Every `[[watcher]]` entry, in file order (which is dispatch order).
    #[serde(default, rename = "watcher")]
    pub watchers: Vec<WatcherConfig>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pipeline: PipelineSection,
    watchers: Vec<WatcherConfig>,
}

impl ConfigFile {
    /// Only called after validation.
    pub(crate) fn new_unchecked(pipeline: PipelineSection, watchers: Vec<WatcherConfig>) -> Self {
        Self { pipeline, watchers }
    }

    pub fn pipeline(&self) -> &PipelineSection {
        &self.pipeline
    }

    pub fn watchers(&self) -> &[WatcherConfig] {
        &self.watchers
    }

    /// Apply command-line overrides; callers must keep `interval_ms >= 1`.
    pub fn override_base_dir(&mut self, base_dir: impl Into<PathBuf>) {
        self.pipeline.base_dir = Some(base_dir.into());
    }

    pub fn override_interval_ms(&mut self, interval_ms: u64) {
        self.pipeline.interval_ms = interval_ms.max(1);
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Project directory. Relative paths are resolved against the config
    /// file's directory; `None` means "the config file's directory".
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Directory to poll, relative to `base_dir`.
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,

    /// Milliseconds between two polls.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// `"metadata"` (default) or `"content"`.
    #[serde(default)]
    pub detection: DetectionMode,
}

fn default_watch_dir() -> PathBuf {
    PathBuf::from(DEFAULT_WATCH_DIR)
}

fn default_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            base_dir: None,
            watch_dir: default_watch_dir(),
            interval_ms: default_interval_ms(),
            detection: DetectionMode::default(),
        }
    }
}

impl PipelineSection {
    /// Effective base directory given the directory holding the config file.
    pub fn resolve_base_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => config_dir.join(dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// One `[[watcher]]` entry: a shell command run for matching events.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// Unique name, used in logs.
    pub name: String,

    /// Command to run through the platform shell.
    pub cmd: String,

    /// Glob patterns relative to the watched directory; empty = everything.
    #[serde(default)]
    pub watch: Vec<String>,

    /// Glob patterns that are never accepted.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Event kinds that run the command.
    #[serde(default = "default_events")]
    pub events: Vec<FileEventKind>,

    /// If false, a successful run stops the event from reaching later
    /// watchers.
    #[serde(default = "default_propagate")]
    pub propagate: bool,
}

fn default_events() -> Vec<FileEventKind> {
    FileEventKind::ALL.to_vec()
}

fn default_propagate() -> bool {
    true
}
