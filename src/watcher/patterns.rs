// src/watcher/patterns.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use super::contract::{WatchResult, Watcher};

/// Compiled watch/exclude glob patterns, evaluated relative to a root.
///
/// An empty `watch` list matches every file under the root.
#[derive(Clone)]
pub struct PathFilter {
    root: PathBuf,
    watch_set: Option<GlobSet>,
    exclude_set: Option<GlobSet>,
    watch: Vec<String>,
    exclude: Vec<String>,
}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathFilter")
            .field("root", &self.root)
            .field("watch", &self.watch)
            .field("exclude", &self.exclude)
            .finish()
    }
}

impl PathFilter {
    pub fn new(root: impl Into<PathBuf>, watch: &[String], exclude: &[String]) -> Result<Self> {
        let root = root.into();
        let watch_set = if watch.is_empty() {
            None
        } else {
            Some(build_globset(watch).context("building watch globset")?)
        };
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        Ok(Self {
            root,
            watch_set,
            exclude_set,
            watch: watch.to_vec(),
            exclude: exclude.to_vec(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true if `rel_path` (forward slashes, relative to the root)
    /// is watched and not excluded.
    pub fn matches_relative(&self, rel_path: &str) -> bool {
        if let Some(watch) = &self.watch_set {
            if !watch.is_match(rel_path) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Like [`matches_relative`](Self::matches_relative) but for an absolute
    /// path; paths outside the root never match.
    pub fn matches(&self, path: &Path) -> bool {
        match relative_str(&self.root, path) {
            Some(rel) => self.matches_relative(&rel),
            None => false,
        }
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Purely lexical: `root` must be spelled the way event paths are, which
/// [`resolve_root`] takes care of for filters built from config.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// The spelling of `root` that monitor events will carry.
///
/// The monitor reports paths under its canonicalized root, so an existing
/// root is canonicalized here once. A root that does not exist yet is made
/// absolute and has `.`/`..` segments folded lexically.
pub fn resolve_root(root: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(root) {
        return canonical;
    }

    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(root)
    };

    let mut folded = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                folded.pop();
            }
            other => folded.push(other.as_os_str()),
        }
    }
    folded
}

/// Gates another watcher behind a [`PathFilter`].
///
/// `accept` is true only when both the filter and the inner watcher accept
/// the path; every `on_*` call is forwarded unchanged.
pub struct PatternWatcher {
    filter: PathFilter,
    inner: Arc<dyn Watcher>,
}

impl PatternWatcher {
    pub fn new(filter: PathFilter, inner: Arc<dyn Watcher>) -> Self {
        Self { filter, inner }
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }
}

impl fmt::Debug for PatternWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternWatcher")
            .field("inner", &self.inner.name())
            .field("filter", &self.filter)
            .finish()
    }
}

impl Watcher for PatternWatcher {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn accept(&self, path: &Path) -> bool {
        self.filter.matches(path) && self.inner.accept(path)
    }

    fn on_create(&self, path: &Path) -> WatchResult {
        self.inner.on_create(path)
    }

    fn on_update(&self, path: &Path) -> WatchResult {
        self.inner.on_update(path)
    }

    fn on_delete(&self, path: &Path) -> WatchResult {
        self.inner.on_delete(path)
    }
}
