// src/pipeline/dispatcher.rs

//! Offers one event at a time to the watcher chain.

use std::any::Any;
use std::error::Error as _;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::types::FileEvent;
use crate::watcher::{Propagation, WatchFailure, WatcherRegistry};

/// How a dispatch pass over the chain ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEnd {
    /// Every watcher was consulted.
    Exhausted,
    /// The named watcher returned [`Propagation::Stop`].
    StoppedBy(String),
    /// The named watcher failed, or panicked in `accept` or a handler.
    FailedAt(String),
}

/// Outcome of dispatching a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Watchers whose `on_*` method ran, in order.
    pub invoked: Vec<String>,
    pub end: DispatchEnd,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<WatcherRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<WatcherRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<WatcherRegistry> {
        &self.registry
    }

    /// Walk the chain as it stands right now.
    ///
    /// Watchers that do not `accept` the path are skipped. The first `Stop`
    /// or failure ends the pass; later watchers never see this event.
    /// Failures are logged here and never propagate further. A panic in
    /// `accept` counts as a failure of that watcher.
    pub fn dispatch(&self, event: &FileEvent) -> DispatchReport {
        let kind = event.kind();
        let path = event.path();
        info!(%kind, path = %path.display(), "file change detected");

        let chain = self.registry.snapshot();
        let mut invoked = Vec::new();

        for entry in chain.iter() {
            let watcher = entry.watcher();
            let accepted = panic::catch_unwind(AssertUnwindSafe(|| watcher.accept(path)))
                .map_err(failure_from_panic);
            match accepted {
                Ok(true) => {}
                Ok(false) => {
                    debug!(watcher = entry.name(), ?path, "watcher does not accept path; skipping");
                    continue;
                }
                Err(failure) => {
                    log_failure(entry.name(), event, &failure);
                    return DispatchReport {
                        invoked,
                        end: DispatchEnd::FailedAt(entry.name().to_string()),
                    };
                }
            }

            invoked.push(entry.name().to_string());
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| watcher.on_event(kind, path)))
                .unwrap_or_else(|payload| Err(failure_from_panic(payload)));

            match outcome {
                Ok(Propagation::Continue) => {}
                Ok(Propagation::Stop) => {
                    debug!(watcher = entry.name(), %kind, ?path, "watcher stopped propagation");
                    return DispatchReport {
                        invoked,
                        end: DispatchEnd::StoppedBy(entry.name().to_string()),
                    };
                }
                Err(failure) => {
                    log_failure(entry.name(), event, &failure);
                    return DispatchReport {
                        invoked,
                        end: DispatchEnd::FailedAt(entry.name().to_string()),
                    };
                }
            }
        }

        DispatchReport {
            invoked,
            end: DispatchEnd::Exhausted,
        }
    }
}

fn log_failure(watcher: &str, event: &FileEvent, failure: &WatchFailure) {
    let kind = event.kind();
    let path = event.path().display();
    match failure.source() {
        Some(cause) => error!(
            watcher,
            %kind,
            %path,
            error = %failure,
            %cause,
            "watch failure; aborting dispatch of this event"
        ),
        None => error!(
            watcher,
            %kind,
            %path,
            error = %failure,
            "watch failure; aborting dispatch of this event"
        ),
    }
}

fn failure_from_panic(payload: Box<dyn Any + Send>) -> WatchFailure {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    WatchFailure::new(format!("watcher panicked: {detail}"))
}
