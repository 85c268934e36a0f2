// src/watcher/registry.rs

//! Ordered, copy-on-write collection of registered watchers.
//!
//! Mutations build a fresh sequence and swap it in under the lock; a dispatch
//! pass clones the current `Arc` and iterates it without holding the lock, so
//! registration never sees or produces a half-updated chain.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::contract::Watcher;

/// One registration. Identity is the identity of the registered `Arc`.
#[derive(Clone)]
pub struct WatcherEntry {
    watcher: Arc<dyn Watcher>,
}

impl WatcherEntry {
    fn new(watcher: Arc<dyn Watcher>) -> Self {
        Self { watcher }
    }

    pub fn watcher(&self) -> &dyn Watcher {
        self.watcher.as_ref()
    }

    pub fn name(&self) -> &str {
        self.watcher.name()
    }

    pub fn is(&self, other: &Arc<dyn Watcher>) -> bool {
        Arc::ptr_eq(&self.watcher, other)
    }
}

impl fmt::Debug for WatcherEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherEntry")
            .field("name", &self.name())
            .finish()
    }
}

/// Immutable view of the chain taken at the start of a dispatch pass.
pub type RegistrySnapshot = Arc<Vec<WatcherEntry>>;

#[derive(Default)]
pub struct WatcherRegistry {
    entries: Mutex<RegistrySnapshot>,
}

impl fmt::Debug for WatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherRegistry")
            .field("watchers", &self.names())
            .finish()
    }
}

impl WatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_watchers<I>(watchers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Watcher>>,
    {
        let registry = Self::new();
        registry.replace_all(watchers);
        registry
    }

    fn lock(&self) -> MutexGuard<'_, RegistrySnapshot> {
        // The guarded value is only ever replaced wholesale, so a poisoned
        // lock still holds a complete sequence.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Add `watcher` at the tail, preserving the existing order.
    pub fn append(&self, watcher: Arc<dyn Watcher>) {
        let mut guard = self.lock();
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        debug!(watcher = watcher.name(), position = next.len(), "appending watcher");
        next.push(WatcherEntry::new(watcher));
        *guard = Arc::new(next);
    }

    /// Discard the current chain and replace it with `watchers`, in order.
    pub fn replace_all<I>(&self, watchers: I)
    where
        I: IntoIterator<Item = Arc<dyn Watcher>>,
    {
        let next: Vec<WatcherEntry> = watchers.into_iter().map(WatcherEntry::new).collect();
        debug!(count = next.len(), "replacing watcher chain");
        *self.lock() = Arc::new(next);
    }

    /// Remove the first entry registered with exactly this `Arc`.
    ///
    /// Returns `false` (and leaves the chain untouched) if it was never
    /// registered.
    pub fn remove(&self, watcher: &Arc<dyn Watcher>) -> bool {
        let mut guard = self.lock();
        let Some(index) = guard.iter().position(|e| e.is(watcher)) else {
            debug!(watcher = watcher.name(), "remove: watcher not registered");
            return false;
        };
        let mut next: Vec<WatcherEntry> = guard.iter().cloned().collect();
        next.remove(index);
        debug!(watcher = watcher.name(), index, "removed watcher");
        *guard = Arc::new(next);
        true
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        Arc::clone(&*self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.snapshot().iter().map(|e| e.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::watcher::{Propagation, WatchResult};

    struct Named(&'static str);

    impl Watcher for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn accept(&self, _path: &Path) -> bool {
            true
        }
        fn on_create(&self, _path: &Path) -> WatchResult {
            Ok(Propagation::Continue)
        }
        fn on_update(&self, _path: &Path) -> WatchResult {
            Ok(Propagation::Continue)
        }
        fn on_delete(&self, _path: &Path) -> WatchResult {
            Ok(Propagation::Continue)
        }
    }

    fn named(name: &'static str) -> Arc<dyn Watcher> {
        Arc::new(Named(name))
    }

    #[test]
    fn append_preserves_order_and_allows_duplicates() {
        let registry = WatcherRegistry::new();
        let a = named("a");
        registry.append(Arc::clone(&a));
        registry.append(named("b"));
        registry.append(Arc::clone(&a));

        assert_eq!(registry.names(), vec!["a", "b", "a"]);
    }

    #[test]
    fn remove_drops_only_first_identical_entry() {
        let a = named("a");
        let registry =
            WatcherRegistry::from_watchers([Arc::clone(&a), named("b"), Arc::clone(&a)]);

        assert!(registry.remove(&a));
        assert_eq!(registry.names(), vec!["b", "a"]);
    }

    #[test]
    fn remove_matches_identity_not_name() {
        let registry = WatcherRegistry::from_watchers([named("a")]);
        let lookalike = named("a");

        assert!(!registry.remove(&lookalike));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_mutation() {
        let registry = WatcherRegistry::from_watchers([named("a"), named("b")]);
        let snapshot = registry.snapshot();

        registry.replace_all([named("c")]);
        registry.append(named("d"));

        let names: Vec<&str> = snapshot.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(registry.names(), vec!["c", "d"]);
    }
}
