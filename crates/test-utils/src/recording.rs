use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use watchpipe::types::{FileEvent, FileEventKind};
use watchpipe::watcher::{Propagation, WatchFailure, WatchResult, Watcher};

/// What a [`RecordingWatcher`] does after recording a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Stop,
    Fail(String),
    Panic(String),
}

/// One `on_*` invocation, in the order the dispatcher made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub watcher: String,
    pub event: FileEvent,
}

/// Calls shared between several recording watchers.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Watcher names, in invocation order.
    pub fn names(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.watcher).collect()
    }

    /// Events seen by `watcher`, in invocation order.
    pub fn events_for(&self, watcher: &str) -> Vec<FileEvent> {
        self.calls()
            .into_iter()
            .filter(|c| c.watcher == watcher)
            .map(|c| c.event)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Wait until at least `count` calls were recorded.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        crate::wait_until(timeout, || self.len() >= count)
    }
}

type AcceptFn = dyn Fn(&Path) -> bool + Send + Sync;
type HookFn = dyn Fn(&FileEvent) + Send + Sync;

/// Configurable watcher that records every invocation into a [`Journal`].
///
/// Outcomes are taken from the script first, then from the default outcome.
pub struct RecordingWatcher {
    name: String,
    journal: Journal,
    accept: Box<AcceptFn>,
    script: Mutex<VecDeque<Outcome>>,
    default_outcome: Mutex<Outcome>,
    hook: Option<Box<HookFn>>,
}

impl RecordingWatcher {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            accept: Box::new(|_| true),
            script: Mutex::new(VecDeque::new()),
            default_outcome: Mutex::new(Outcome::Continue),
            hook: None,
        }
    }

    pub fn with_accept(mut self, accept: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.accept = Box::new(accept);
        self
    }

    /// Never accepts anything.
    pub fn rejecting(self) -> Self {
        self.with_accept(|_| false)
    }

    pub fn with_outcome(self, outcome: Outcome) -> Self {
        *self.default_outcome.lock().unwrap() = outcome;
        self
    }

    /// Outcomes for the next calls, consumed one per call.
    pub fn with_script(self, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        self.script.lock().unwrap().extend(outcomes);
        self
    }

    /// Runs after the call was recorded and before the outcome is applied.
    pub fn with_hook(mut self, hook: impl Fn(&FileEvent) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.default_outcome.lock().unwrap() = outcome;
    }

    pub fn into_arc(self) -> Arc<dyn Watcher> {
        Arc::new(self)
    }

    fn record(&self, kind: FileEventKind, path: &Path) -> WatchResult {
        let event = FileEvent::new(kind, PathBuf::from(path));
        self.journal.push(Call {
            watcher: self.name.clone(),
            event: event.clone(),
        });
        if let Some(hook) = &self.hook {
            hook(&event);
        }

        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.lock().unwrap().clone());

        match outcome {
            Outcome::Continue => Ok(Propagation::Continue),
            Outcome::Stop => Ok(Propagation::Stop),
            Outcome::Fail(message) => Err(WatchFailure::new(message)),
            Outcome::Panic(message) => panic!("{message}"),
        }
    }
}

impl Watcher for RecordingWatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn accept(&self, path: &Path) -> bool {
        (self.accept)(path)
    }

    fn on_create(&self, path: &Path) -> WatchResult {
        self.record(FileEventKind::Create, path)
    }

    fn on_update(&self, path: &Path) -> WatchResult {
        self.record(FileEventKind::Update, path)
    }

    fn on_delete(&self, path: &Path) -> WatchResult {
        self.record(FileEventKind::Delete, path)
    }
}
