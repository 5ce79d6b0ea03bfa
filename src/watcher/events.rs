//! File system event types and coalescing.

#![allow(clippy::missing_const_for_fn)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// File system change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// File or directory was created.
    Created(PathBuf),
    /// File content or metadata changed.
    Modified(PathBuf),
    /// File or directory was removed.
    Deleted(PathBuf),
}

impl FileEvent {
    /// Get the path associated with this event.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Modified(p) | Self::Deleted(p) => p,
        }
    }

    /// Short name of the event kind, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Modified(_) => "modified",
            Self::Deleted(_) => "deleted",
        }
    }
}

/// Distinct paths touched since the last re-index.
///
/// Re-indexing is always a full walk, so this only records how much churn a
/// debounce window absorbed.
#[derive(Debug, Default)]
pub struct ChangeSet {
    paths: BTreeSet<PathBuf>,
    events: usize,
}

impl ChangeSet {
    /// Create an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event.
    pub fn add(&mut self, event: &FileEvent) {
        self.events += 1;
        self.paths.insert(event.path().to_path_buf());
    }

    /// Number of distinct paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Number of events recorded, including repeats.
    #[must_use]
    pub fn events(&self) -> usize {
        self.events
    }

    /// Check if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    /// Forget everything recorded.
    pub fn clear(&mut self) {
        self.paths.clear();
        self.events = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_path_and_kind() {
        let created = FileEvent::Created(PathBuf::from("/test/new.rs"));
        assert_eq!(created.path(), Path::new("/test/new.rs"));
        assert_eq!(created.kind(), "created");

        let modified = FileEvent::Modified(PathBuf::from("/test/file.rs"));
        assert_eq!(modified.path(), Path::new("/test/file.rs"));
        assert_eq!(modified.kind(), "modified");

        let deleted = FileEvent::Deleted(PathBuf::from("/test/removed.rs"));
        assert_eq!(deleted.path(), Path::new("/test/removed.rs"));
        assert_eq!(deleted.kind(), "deleted");
    }

    #[test]
    fn test_change_set_dedups_paths() {
        let mut changes = ChangeSet::new();
        assert!(changes.is_empty());

        changes.add(&FileEvent::Created(PathBuf::from("/a.rs")));
        changes.add(&FileEvent::Modified(PathBuf::from("/a.rs")));
        changes.add(&FileEvent::Modified(PathBuf::from("/b.rs")));

        assert!(!changes.is_empty());
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.events(), 3);

        changes.clear();
        assert!(changes.is_empty());
        assert_eq!(changes.len(), 0);
    }
}
