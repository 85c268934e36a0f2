// src/errors.rs

//! Crate-wide error types.
//!
//! Two layers live here:
//! - [`MonitorError`] for everything the background poller can report.
//! - [`PipelineError`] for the public pipeline / config API.
//!
//! Event-scoped watcher failures are *not* part of this hierarchy; see
//! [`crate::watcher::WatchFailure`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("cannot watch {path:?}: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("monitor is already running")]
    AlreadyStarted,

    #[error("failed to spawn monitor worker: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("monitor worker '{worker}' panicked")]
    WorkerPanicked { worker: String },

    #[error("failed to scan {path:?}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error("pipeline has been shut down; create a new pipeline to watch again")]
    Terminated,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
