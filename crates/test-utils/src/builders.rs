#![allow(dead_code)]

use std::path::PathBuf;

use watchpipe::config::{ConfigFile, PipelineSection, RawConfigFile, WatcherConfig};
use watchpipe::types::{DetectionMode, FileEventKind};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                pipeline: PipelineSection::default(),
                watchers: Vec::new(),
            },
        }
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pipeline.base_dir = Some(dir.into());
        self
    }

    pub fn watch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pipeline.watch_dir = dir.into();
        self
    }

    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.config.pipeline.interval_ms = ms;
        self
    }

    pub fn detection(mut self, mode: DetectionMode) -> Self {
        self.config.pipeline.detection = mode;
        self
    }

    pub fn with_watcher(mut self, watcher: WatcherConfig) -> Self {
        self.config.watchers.push(watcher);
        self
    }

    /// Raw form, for exercising validation failures.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WatcherConfig`.
pub struct WatcherConfigBuilder {
    watcher: WatcherConfig,
}

impl WatcherConfigBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            watcher: WatcherConfig {
                name: name.to_string(),
                cmd: cmd.to_string(),
                watch: vec![],
                exclude: vec![],
                events: FileEventKind::ALL.to_vec(),
                propagate: true,
            },
        }
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.watcher.watch.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.watcher.exclude.push(pattern.to_string());
        self
    }

    pub fn events(mut self, events: &[FileEventKind]) -> Self {
        self.watcher.events = events.to_vec();
        self
    }

    pub fn propagate(mut self, val: bool) -> Self {
        self.watcher.propagate = val;
        self
    }

    pub fn build(self) -> WatcherConfig {
        self.watcher
    }
}
