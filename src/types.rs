use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// Kind of change detected by the monitor for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEventKind {
    #[serde(alias = "created")]
    Create,
    #[serde(alias = "updated")]
    Update,
    #[serde(alias = "deleted")]
    Delete,
}

impl FileEventKind {
    pub const ALL: [FileEventKind; 3] = [
        FileEventKind::Create,
        FileEventKind::Update,
        FileEventKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileEventKind::Create => "create",
            FileEventKind::Update => "update",
            FileEventKind::Delete => "delete",
        }
    }
}

impl fmt::Display for FileEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" | "created" => Ok(FileEventKind::Create),
            "update" | "updated" => Ok(FileEventKind::Update),
            "delete" | "deleted" => Ok(FileEventKind::Delete),
            other => Err(format!(
                "invalid event kind: {other} (expected \"create\", \"update\" or \"delete\")"
            )),
        }
    }
}

/// One file-system change, produced by the monitor and consumed once by the
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    kind: FileEventKind,
    path: PathBuf,
}

impl FileEvent {
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::Create, path)
    }

    pub fn updated(path: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::Update, path)
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::Delete, path)
    }

    pub fn kind(&self) -> FileEventKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lifecycle state of a [`crate::pipeline::Pipeline`].
///
/// `Stopped` is terminal: a new pipeline is required to watch again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Watching,
    Stopped,
}

/// How the monitor decides that an existing file was updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Size or modification time changed.
    Metadata,
    /// Metadata changed *and* the blake3 digest of the contents differs.
    Content,
}

impl Default for DetectionMode {
    fn default() -> Self {
        DetectionMode::Metadata
    }
}

impl DetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMode::Metadata => "metadata",
            DetectionMode::Content => "content",
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metadata" => Ok(DetectionMode::Metadata),
            "content" => Ok(DetectionMode::Content),
            other => Err(format!(
                "invalid detection mode: {other} (expected \"metadata\" or \"content\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_parses_both_spellings() {
        assert_eq!("create".parse::<FileEventKind>(), Ok(FileEventKind::Create));
        assert_eq!(" Updated ".parse::<FileEventKind>(), Ok(FileEventKind::Update));
        assert_eq!("deleted".parse::<FileEventKind>(), Ok(FileEventKind::Delete));
        assert!("moved".parse::<FileEventKind>().is_err());
    }

    #[test]
    fn detection_mode_round_trips_through_display() {
        for mode in [DetectionMode::Metadata, DetectionMode::Content] {
            assert_eq!(mode.to_string().parse::<DetectionMode>(), Ok(mode));
        }
        assert_eq!(DetectionMode::default(), DetectionMode::Metadata);
    }
}
