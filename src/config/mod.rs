// src/config/mod.rs

//! Configuration loading and validation for watchpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it into a [`ConfigFile`] (`validate.rs`).
//! - Turn a validated config into pipeline options and watchers.

pub mod loader;
pub mod model;
pub mod validate;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub use loader::{config_root_dir, default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, PipelineSection, RawConfigFile, WatcherConfig};

use crate::errors::Result;
use crate::monitor::MonitorOptions;
use crate::pipeline::PipelineOptions;
use crate::watcher::{resolve_root, CommandWatcher, PathFilter, Watcher};

impl ConfigFile {
    /// Effective pipeline options; `config_dir` anchors relative paths.
    pub fn pipeline_options(&self, config_dir: &Path) -> PipelineOptions {
        let section = self.pipeline();
        PipelineOptions {
            base_dir: section.resolve_base_dir(config_dir),
            watch_dir: section.watch_dir.clone(),
            monitor: MonitorOptions {
                interval: Duration::from_millis(section.interval_ms),
                detection: section.detection,
                ..MonitorOptions::default()
            },
        }
    }

    /// One [`CommandWatcher`] per `[[watcher]]` entry, in file order.
    ///
    /// Globs are evaluated relative to the watched root of `options`,
    /// spelled the way the monitor reports event paths.
    pub fn build_watchers(&self, options: &PipelineOptions) -> Result<Vec<Arc<dyn Watcher>>> {
        let root = resolve_root(&options.watched_root());
        let mut watchers: Vec<Arc<dyn Watcher>> = Vec::with_capacity(self.watchers().len());

        for cfg in self.watchers() {
            let filter = PathFilter::new(root.clone(), &cfg.watch, &cfg.exclude)?;
            let watcher = CommandWatcher::new(cfg.name.clone(), cfg.cmd.clone(), filter)
                .with_events(cfg.events.iter().copied())
                .with_propagate(cfg.propagate);
            watchers.push(Arc::new(watcher));
        }

        Ok(watchers)
    }
}
