// src/monitor/snapshot.rs

//! Point-in-time view of the watched tree and the delta between two views.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::errors::MonitorError;
use crate::fs::{EntryKind, FileSystem};
use crate::monitor::hash::compute_file_hash;
use crate::types::{DetectionMode, FileEvent};

/// What the monitor remembers about one regular file between polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSignature {
    pub len: u64,
    pub modified: Option<SystemTime>,
    /// Content digest, only recorded in [`DetectionMode::Content`].
    pub digest: Option<String>,
}

impl FileSignature {
    fn same_metadata(&self, other: &FileSignature) -> bool {
        self.len == other.len && self.modified == other.modified
    }

    /// Whether moving from `self` to `next` counts as an update.
    ///
    /// Metadata must differ; when both sides carry a digest, the digests
    /// must differ too.
    pub fn changed_to(&self, next: &FileSignature) -> bool {
        if self.same_metadata(next) {
            return false;
        }
        match (&self.digest, &next.digest) {
            (Some(old), Some(new)) => old != new,
            _ => true,
        }
    }
}

/// Every regular file under a root, keyed by absolute path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    files: BTreeMap<PathBuf, FileSignature>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, signature: FileSignature) {
        self.files.insert(path.into(), signature);
    }

    pub fn get(&self, path: &Path) -> Option<&FileSignature> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Walk `root` recursively and record every regular file.
    ///
    /// - Symbolic links are neither followed nor recorded.
    /// - Entries that vanish or cannot be read mid-walk are skipped; the
    ///   next poll sees them as absent.
    /// - Only a failure to list `root` itself is an error.
    ///
    /// In content mode, digests from `previous` are reused for files whose
    /// metadata did not change.
    pub fn scan(
        fs: &dyn FileSystem,
        root: &Path,
        mode: DetectionMode,
        previous: Option<&Snapshot>,
    ) -> Result<Snapshot, MonitorError> {
        let top = fs.read_dir(root).map_err(|source| MonitorError::Scan {
            path: root.to_path_buf(),
            source,
        })?;

        let mut snapshot = Snapshot::new();
        let mut stack = vec![top];

        while let Some(entries) = stack.pop() {
            for path in entries {
                let meta = match fs.metadata(&path) {
                    Ok(meta) => meta,
                    Err(err) => {
                        debug!(?path, error = %err, "entry vanished during scan; skipping");
                        continue;
                    }
                };

                match meta.kind {
                    EntryKind::Dir => match fs.read_dir(&path) {
                        Ok(children) => stack.push(children),
                        Err(err) => {
                            debug!(?path, error = %err, "unreadable directory; skipping");
                        }
                    },
                    EntryKind::File => {
                        let mut signature = FileSignature {
                            len: meta.len,
                            modified: meta.modified,
                            digest: None,
                        };
                        if mode == DetectionMode::Content {
                            signature.digest =
                                digest_for(fs, &path, &signature, previous);
                        }
                        snapshot.insert(path, signature);
                    }
                    EntryKind::Symlink | EntryKind::Other => {
                        debug!(?path, kind = ?meta.kind, "ignoring non-regular entry");
                    }
                }
            }
        }

        Ok(snapshot)
    }

    /// Events that turn `self` into `next`.
    ///
    /// Emitted as all deletions, then updates, then creations, each group in
    /// path order.
    pub fn diff(&self, next: &Snapshot) -> Vec<FileEvent> {
        let mut deleted = Vec::new();
        let mut updated = Vec::new();
        let mut created = Vec::new();

        for (path, old) in &self.files {
            match next.files.get(path) {
                None => deleted.push(FileEvent::deleted(path.clone())),
                Some(new) if old.changed_to(new) => updated.push(FileEvent::updated(path.clone())),
                Some(_) => {}
            }
        }

        for path in next.files.keys() {
            if !self.files.contains_key(path) {
                created.push(FileEvent::created(path.clone()));
            }
        }

        deleted.extend(updated);
        deleted.extend(created);
        deleted
    }
}

fn digest_for(
    fs: &dyn FileSystem,
    path: &Path,
    signature: &FileSignature,
    previous: Option<&Snapshot>,
) -> Option<String> {
    if let Some(old) = previous.and_then(|p| p.get(path)) {
        if old.same_metadata(signature) && old.digest.is_some() {
            return old.digest.clone();
        }
    }

    match compute_file_hash(fs, path) {
        Ok(digest) => Some(digest),
        Err(err) => {
            debug!(?path, error = %err, "could not hash file; comparing metadata only");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::types::FileEventKind;

    fn root() -> &'static Path {
        Path::new("/project/src/main")
    }

    fn scan(fs: &MockFileSystem, previous: Option<&Snapshot>, mode: DetectionMode) -> Snapshot {
        Snapshot::scan(fs, root(), mode, previous).unwrap()
    }

    #[test]
    fn scan_is_recursive_and_ignores_symlinks() {
        let fs = MockFileSystem::new();
        fs.add_file("/project/src/main/a.txt", "a");
        fs.add_file("/project/src/main/deep/er/b.txt", "b");
        fs.add_symlink("/project/src/main/link", "/project/src/main/deep");
        fs.add_dir("/project/src/main/empty");

        let snap = scan(&fs, None, DetectionMode::Metadata);
        let paths: Vec<&Path> = snap.paths().collect();
        assert_eq!(
            paths,
            vec![
                Path::new("/project/src/main/a.txt"),
                Path::new("/project/src/main/deep/er/b.txt"),
            ]
        );
    }

    #[test]
    fn scan_of_missing_root_is_an_error() {
        let fs = MockFileSystem::new();
        let err = Snapshot::scan(&fs, root(), DetectionMode::Metadata, None).unwrap_err();
        assert!(matches!(err, MonitorError::Scan { .. }));
    }

    #[test]
    fn diff_classifies_each_path() {
        let fs = MockFileSystem::new();
        fs.add_file("/project/src/main/f1", "one");
        fs.add_file("/project/src/main/f2", "two");
        let before = scan(&fs, None, DetectionMode::Metadata);

        fs.remove("/project/src/main/f1");
        fs.add_file("/project/src/main/f2", "two, modified");
        fs.add_file("/project/src/main/f3", "three");
        let after = scan(&fs, Some(&before), DetectionMode::Metadata);

        let events = before.diff(&after);
        assert_eq!(
            events,
            vec![
                FileEvent::deleted("/project/src/main/f1"),
                FileEvent::updated("/project/src/main/f2"),
                FileEvent::created("/project/src/main/f3"),
            ]
        );
    }

    #[test]
    fn same_length_rewrite_is_detected_through_mtime() {
        let fs = MockFileSystem::new();
        fs.add_file("/project/src/main/a", "aaa");
        let before = scan(&fs, None, DetectionMode::Metadata);

        fs.add_file("/project/src/main/a", "bbb");
        let after = scan(&fs, Some(&before), DetectionMode::Metadata);

        let kinds: Vec<FileEventKind> = before.diff(&after).iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![FileEventKind::Update]);
    }

    #[test]
    fn content_mode_ignores_touch() {
        let fs = MockFileSystem::new();
        fs.add_file("/project/src/main/a", "same");
        let before = scan(&fs, None, DetectionMode::Content);

        fs.touch("/project/src/main/a");
        let touched = scan(&fs, Some(&before), DetectionMode::Content);
        assert!(before.diff(&touched).is_empty());

        // Metadata mode reports the same touch.
        let meta_before = scan(&fs, None, DetectionMode::Metadata);
        fs.touch("/project/src/main/a");
        let meta_after = scan(&fs, Some(&meta_before), DetectionMode::Metadata);
        assert_eq!(meta_before.diff(&meta_after).len(), 1);
    }

    #[test]
    fn rename_is_delete_plus_create() {
        let fs = MockFileSystem::new();
        fs.add_file("/project/src/main/old.txt", "x");
        let before = scan(&fs, None, DetectionMode::Metadata);

        fs.rename("/project/src/main/old.txt", "/project/src/main/new.txt");
        let after = scan(&fs, Some(&before), DetectionMode::Metadata);

        assert_eq!(
            before.diff(&after),
            vec![
                FileEvent::deleted("/project/src/main/old.txt"),
                FileEvent::created("/project/src/main/new.txt"),
            ]
        );
    }
}
