// src/config/validate.rs

use std::collections::HashSet;

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile, WatcherConfig};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.pipeline, raw.watchers))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_pipeline_section(cfg)?;
    validate_watcher_names(cfg)?;
    for watcher in &cfg.watchers {
        validate_watcher(watcher)?;
    }
    Ok(())
}

fn validate_pipeline_section(cfg: &RawConfigFile) -> Result<()> {
    // `detection` is strongly typed and validated during deserialization.

    if cfg.pipeline.interval_ms == 0 {
        return Err(PipelineError::ConfigError(
            "[pipeline].interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.pipeline.watch_dir.is_absolute() {
        return Err(PipelineError::ConfigError(format!(
            "[pipeline].watch_dir must be relative to base_dir (got {:?})",
            cfg.pipeline.watch_dir
        )));
    }

    Ok(())
}

fn validate_watcher_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for watcher in &cfg.watchers {
        if watcher.name.trim().is_empty() {
            return Err(PipelineError::ConfigError(
                "every [[watcher]] needs a non-empty `name`".to_string(),
            ));
        }
        if !seen.insert(watcher.name.as_str()) {
            return Err(PipelineError::ConfigError(format!(
                "duplicate watcher name '{}'",
                watcher.name
            )));
        }
    }
    Ok(())
}

fn validate_watcher(watcher: &WatcherConfig) -> Result<()> {
    if watcher.cmd.trim().is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "watcher '{}' has an empty `cmd`",
            watcher.name
        )));
    }

    if watcher.events.is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "watcher '{}' subscribes to no events; remove it or list at least one of create/update/delete",
            watcher.name
        )));
    }

    for pattern in watcher.watch.iter().chain(watcher.exclude.iter()) {
        Glob::new(pattern)?;
    }

    Ok(())
}
