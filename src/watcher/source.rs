//! File system event source using notify-rs.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::events::FileEvent;
use crate::error::WatcherError;
use crate::index::{has_ignored_dir, relative_path};
use crate::Result;

/// Default capacity of the event channel. Events beyond it are dropped; one
/// undelivered event is enough to know the tree changed.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A stream of change events for one root.
///
/// Owns the OS subscription, if any; dropping the stream releases it.
pub struct EventStream {
    rx: mpsc::Receiver<FileEvent>,
    subscription: Option<RecommendedWatcher>,
}

impl EventStream {
    /// Wrap a plain channel. Used to drive the watcher from any producer.
    #[must_use]
    pub fn from_channel(rx: mpsc::Receiver<FileEvent>) -> Self {
        Self {
            rx,
            subscription: None,
        }
    }

    /// Subscribe to recursive change notifications under `root`.
    ///
    /// Events under built-in deny-listed directories, or under any of
    /// `excluded`, are dropped before delivery. Access events are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist or cannot be watched.
    pub fn watch(root: &Path, excluded: &[PathBuf], capacity: usize) -> Result<Self> {
        if !root.is_dir() {
            return Err(WatcherError::WatchFailed {
                path: root.display().to_string(),
                reason: "directory does not exist".to_string(),
            }
            .into());
        }

        // Notifications carry canonical paths.
        let root = root.canonicalize().map_err(|e| WatcherError::WatchFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;
        let excluded: Vec<PathBuf> = excluded
            .iter()
            .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
            .collect();

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let filter_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for change in translate(&filter_root, &excluded, event) {
                        if tx.try_send(change).is_err() {
                            tracing::trace!("Event channel full or closed, dropping event");
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Watch error: {:?}", e);
                }
            }
        })
        .map_err(|e| WatcherError::WatchFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| WatcherError::WatchFailed {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %root.display(), "Watching directory");

        Ok(Self {
            rx,
            subscription: Some(watcher),
        })
    }

    /// Receive the next event.
    ///
    /// Returns `None` once every producer has gone away.
    pub async fn recv(&mut self) -> Option<FileEvent> {
        self.rx.recv().await
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("subscribed", &self.subscription.is_some())
            .finish_non_exhaustive()
    }
}

/// Map a notify event to zero or more change events under `root`.
fn translate(root: &Path, excluded: &[PathBuf], event: Event) -> Vec<FileEvent> {
    let make: fn(PathBuf) -> FileEvent = match event.kind {
        EventKind::Create(_) => FileEvent::Created,
        EventKind::Modify(_) | EventKind::Any => FileEvent::Modified,
        EventKind::Remove(_) => FileEvent::Deleted,
        EventKind::Access(_) | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .filter(|path| is_relevant(root, excluded, path))
        .map(make)
        .collect()
}

fn is_relevant(root: &Path, excluded: &[PathBuf], path: &Path) -> bool {
    if !path.starts_with(root) || excluded.iter().any(|dir| path.starts_with(dir)) {
        return false;
    }
    !has_ignored_dir(&relative_path(root, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};
    use std::time::Duration;
    use tempfile::TempDir;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
    }

    #[test]
    fn test_translate_kinds() {
        let root = Path::new("/ws");
        let created = translate(root, &[], event(EventKind::Create(CreateKind::File), &["/ws/a.rs"]));
        assert_eq!(created, vec![FileEvent::Created(PathBuf::from("/ws/a.rs"))]);

        let modified = translate(
            root,
            &[],
            event(EventKind::Modify(ModifyKind::Any), &["/ws/a.rs", "/ws/b.rs"]),
        );
        assert_eq!(modified.len(), 2);

        let removed = translate(root, &[], event(EventKind::Remove(RemoveKind::File), &["/ws/a.rs"]));
        assert_eq!(removed, vec![FileEvent::Deleted(PathBuf::from("/ws/a.rs"))]);

        let access = translate(root, &[], event(EventKind::Access(AccessKind::Any), &["/ws/a.rs"]));
        assert!(access.is_empty());
    }

    #[test]
    fn test_translate_drops_ignored_paths() {
        let root = Path::new("/ws");
        let excluded = vec![PathBuf::from("/ws/store")];
        let changes = translate(
            root,
            &excluded,
            event(
                EventKind::Modify(ModifyKind::Any),
                &[
                    "/ws/src/lib.rs",
                    "/ws/.git/index",
                    "/ws/web/node_modules/x/index.js",
                    "/ws/store/ws.json",
                    "/elsewhere/file.rs",
                ],
            ),
        );
        assert_eq!(changes, vec![FileEvent::Modified(PathBuf::from("/ws/src/lib.rs"))]);
    }

    #[test]
    fn test_watch_nonexistent_dir() {
        let result = EventStream::watch(Path::new("/nonexistent/directory"), &[], 16);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_watch_delivers_events() {
        let tmp = TempDir::new().unwrap();
        let mut stream = EventStream::watch(tmp.path(), &[], 16).unwrap();

        std::fs::write(tmp.path().join("main.py"), "print('hi')\n").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), stream.recv())
            .await
            .expect("no event within timeout")
            .expect("stream closed");
        assert!(event.path().ends_with("main.py"));
    }

    #[tokio::test]
    async fn test_channel_stream() {
        let (tx, rx) = mpsc::channel(4);
        let mut stream = EventStream::from_channel(rx);
        tx.send(FileEvent::Deleted(PathBuf::from("/a"))).await.unwrap();
        drop(tx);

        assert_eq!(
            stream.recv().await,
            Some(FileEvent::Deleted(PathBuf::from("/a")))
        );
        assert_eq!(stream.recv().await, None);
    }
}
