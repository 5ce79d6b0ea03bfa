//! Integration tests for the file watcher driving real re-indexes.

use codeindex::index::Indexer;
use codeindex::watcher::{
    self, EventStream, ForceOutcome, IndexPipeline, WatchState, WatcherConfig, WatcherHandle,
    WatcherNotification,
};
use codeindex::{CodebaseIndex, IndexStore};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

const DEBOUNCE: Duration = Duration::from_millis(150);

struct Fixture {
    workspace: TempDir,
    _data: TempDir,
    store: IndexStore,
    handle: WatcherHandle,
    notifications: UnboundedReceiver<WatcherNotification>,
}

fn start() -> Fixture {
    let workspace = TempDir::new().unwrap();
    fs::write(workspace.path().join("a.py"), "def foo():\n    pass\n").unwrap();
    let root = workspace.path().canonicalize().unwrap();

    let data = TempDir::new().unwrap();
    let store = IndexStore::open(data.path()).unwrap();
    let pipeline = Arc::new(IndexPipeline::new(Indexer::default(), store.clone()));
    let events = EventStream::watch(&root, &[], 256).unwrap();

    let (handle, notifications) = watcher::spawn(
        root,
        pipeline,
        events,
        &WatcherConfig { debounce: DEBOUNCE },
        None,
    );

    Fixture {
        workspace,
        _data: data,
        store,
        handle,
        notifications,
    }
}

async fn next_index(rx: &mut UnboundedReceiver<WatcherNotification>) -> Arc<CodebaseIndex> {
    let notification = timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("no notification within timeout")
        .expect("notification channel closed");
    match notification {
        WatcherNotification::Indexed(index) => index,
        WatcherNotification::Failed(message) => panic!("re-index failed: {message}"),
    }
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Test that a manual re-index builds and persists a snapshot.
#[tokio::test]
async fn test_force_reindex_persists_snapshot() {
    let mut fx = start();

    assert_eq!(fx.handle.force_reindex().await, ForceOutcome::Started);
    let index = next_index(&mut fx.notifications).await;

    assert_eq!(index.file_count, 1);
    assert_eq!(fx.handle.status().indexed_files, 1);

    let stored = fx.store.metadata(fx.workspace.path()).unwrap().unwrap();
    assert_eq!(stored.file_count, 1);
    fx.handle.stop().await;
}

/// Test that file changes settle into a re-index that sees them.
#[tokio::test]
async fn test_changes_trigger_reindex() {
    let mut fx = start();
    let root = fx.workspace.path().to_path_buf();

    write(&root, "b.ts", "export class Widget {}\n");
    write(&root, "lib/c.js", "function helper() {}\n");

    // Events can straddle a debounce window; wait until a snapshot has both.
    let index = loop {
        let index = next_index(&mut fx.notifications).await;
        if index.file_count == 3 {
            break index;
        }
    };

    assert!(index.file("b.ts").is_some());
    assert!(index.file("lib/c.js").is_some());
    assert_eq!(fx.handle.current().unwrap().file_count, 3);
    fx.handle.stop().await;
}

/// Test that churn inside deny-listed directories is not watched.
#[tokio::test]
async fn test_ignored_directories_do_not_trigger() {
    let mut fx = start();
    let root = fx.workspace.path().to_path_buf();
    fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
    // Let the directory creation itself settle.
    tokio::time::sleep(DEBOUNCE * 4).await;
    while fx.notifications.try_recv().is_ok() {}

    write(&root, "node_modules/pkg/index.js", "function hidden() {}\n");
    write(&root, ".git/HEAD", "ref: refs/heads/main\n");

    let quiet = timeout(DEBOUNCE * 6, fx.notifications.recv()).await;
    assert!(quiet.is_err(), "ignored paths triggered a re-index");
    fx.handle.stop().await;
}

/// Test that stopping ends the watcher for good.
#[tokio::test]
async fn test_stop_is_terminal() {
    let mut fx = start();
    fx.handle.stop().await;

    let status = fx.handle.status();
    assert_eq!(status.state, WatchState::Stopped);
    assert!(!status.is_watching);
    assert_eq!(fx.handle.force_reindex().await, ForceOutcome::Stopped);

    write(fx.workspace.path(), "late.py", "def late():\n    pass\n");
    let quiet = timeout(DEBOUNCE * 4, fx.notifications.recv()).await;
    assert!(matches!(quiet, Ok(None)));
}
