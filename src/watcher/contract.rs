// src/watcher/contract.rs

//! The capability set implemented by pipeline participants.

use std::error::Error as StdError;
use std::path::Path;

use thiserror::Error;

use crate::types::FileEventKind;

/// What the dispatcher should do after a watcher handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Offer the event to the next watcher in the chain.
    Continue,
    /// No further watcher sees this event.
    Stop,
}

impl Propagation {
    pub fn from_continue_flag(keep_going: bool) -> Self {
        if keep_going {
            Propagation::Continue
        } else {
            Propagation::Stop
        }
    }
}

/// Recoverable, event-scoped failure raised by a watcher.
///
/// Aborts dispatch of the current event only; the monitor keeps running.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct WatchFailure {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl WatchFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for WatchFailure {
    fn from(err: anyhow::Error) -> Self {
        Self {
            message: format!("{err:#}"),
            source: Some(err.into()),
        }
    }
}

pub type WatchResult = Result<Propagation, WatchFailure>;

/// A collaborator reacting to file changes under the watched root.
///
/// `accept` must be cheap and side-effect free: it is consulted for every
/// event, before the matching `on_*` method. The `on_*` methods run on the
/// monitor worker and may take as long as they need; events queue up behind
/// them.
pub trait Watcher: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn accept(&self, path: &Path) -> bool;

    fn on_create(&self, path: &Path) -> WatchResult;

    fn on_update(&self, path: &Path) -> WatchResult;

    fn on_delete(&self, path: &Path) -> WatchResult;

    /// Route to the `on_*` method matching `kind`.
    fn on_event(&self, kind: FileEventKind, path: &Path) -> WatchResult {
        match kind {
            FileEventKind::Create => self.on_create(path),
            FileEventKind::Update => self.on_update(path),
            FileEventKind::Delete => self.on_delete(path),
        }
    }
}
