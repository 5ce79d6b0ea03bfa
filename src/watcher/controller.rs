//! Debounced re-index state machine.
//!
//! One controller task runs per watched root. It owns the event stream, the
//! single debounce deadline and the in-flight re-index, and is the only
//! writer of the shared status. Callers talk to it through a
//! [`WatcherHandle`] and receive results on a notification channel.

use std::future::pending;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep_until, Instant};

use super::events::{ChangeSet, FileEvent};
use super::pipeline::Reindex;
use super::source::EventStream;
use crate::error::WatcherError;
use crate::index::CodebaseIndex;
use crate::Result;

/// Default quiet period before a re-index.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(5000);

/// Watcher configuration.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Quiet period after the last event before re-indexing.
    pub debounce: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WatchState {
    Idle,
    PendingDebounce,
    Indexing,
    /// Terminal.
    Stopped,
}

/// Point-in-time view of a watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherStatus {
    pub is_watching: bool,
    pub is_indexing: bool,
    pub has_pending_changes: bool,
    /// File count of the held snapshot, 0 if none.
    pub indexed_files: usize,
    /// When the held snapshot's walk began.
    pub last_indexed: Option<DateTime<Utc>>,
    pub state: WatchState,
}

/// Emitted after every re-index attempt.
#[derive(Debug, Clone)]
pub enum WatcherNotification {
    /// A new snapshot replaced the held one.
    Indexed(Arc<CodebaseIndex>),
    /// The attempt failed; the held snapshot is unchanged.
    Failed(String),
}

/// Result of a manual re-index request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceOutcome {
    Started,
    /// A re-index is already running; nothing was queued.
    AlreadyRunning,
    Stopped,
}

enum Command {
    ForceReindex(oneshot::Sender<ForceOutcome>),
    Stop(oneshot::Sender<()>),
}

struct Shared {
    status: WatcherStatus,
    current: Option<Arc<CodebaseIndex>>,
}

/// Handle to a running watcher. Dropping every clone stops the watcher.
#[derive(Clone)]
pub struct WatcherHandle {
    root: PathBuf,
    commands: mpsc::UnboundedSender<Command>,
    shared: Arc<Mutex<Shared>>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl WatcherHandle {
    /// Watched root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> WatcherStatus {
        self.shared.lock().status.clone()
    }

    /// Most recent snapshot, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<CodebaseIndex>> {
        self.shared.lock().current.clone()
    }

    /// Re-index now, skipping the debounce.
    ///
    /// A no-op if a re-index is already running.
    pub async fn force_reindex(&self) -> ForceOutcome {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::ForceReindex(tx)).is_err() {
            return ForceOutcome::Stopped;
        }
        rx.await.unwrap_or(ForceOutcome::Stopped)
    }

    /// Stop watching. Idempotent.
    ///
    /// Cancels a pending debounce and releases the event subscription. A
    /// re-index already running is left to finish but its result is dropped.
    pub async fn stop(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Stop(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Check if the watcher has stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.commands.is_closed() || self.status().state == WatchState::Stopped
    }
}

/// Start a watcher for `root` on the current Tokio runtime.
///
/// `initial` seeds the held snapshot, e.g. from the store.
pub fn spawn<R: Reindex>(
    root: PathBuf,
    pipeline: Arc<R>,
    events: EventStream,
    config: &WatcherConfig,
    initial: Option<Arc<CodebaseIndex>>,
) -> (WatcherHandle, mpsc::UnboundedReceiver<WatcherNotification>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (notify_tx, notify_rx) = mpsc::unbounded_channel();

    let status = WatcherStatus {
        is_watching: true,
        is_indexing: false,
        has_pending_changes: false,
        indexed_files: initial.as_ref().map_or(0, |i| i.file_count),
        last_indexed: initial.as_ref().map(|i| i.last_indexed),
        state: WatchState::Idle,
    };
    let shared = Arc::new(Mutex::new(Shared {
        status,
        current: initial,
    }));

    let controller = Controller {
        root: root.clone(),
        pipeline,
        debounce: config.debounce,
        events: Some(events),
        deadline: None,
        pending: false,
        in_flight: None,
        changes: ChangeSet::new(),
        shared: Arc::clone(&shared),
        notify_tx,
    };

    tracing::info!(root = %root.display(), debounce_ms = config.debounce.as_millis(), "Watcher started");
    tokio::spawn(controller.run(command_rx));

    (
        WatcherHandle {
            root,
            commands: command_tx,
            shared,
        },
        notify_rx,
    )
}

type ReindexTask = JoinHandle<Result<CodebaseIndex>>;

struct InFlight {
    task: ReindexTask,
    started: Instant,
}

struct Controller<R> {
    root: PathBuf,
    pipeline: Arc<R>,
    debounce: Duration,
    events: Option<EventStream>,
    deadline: Option<Instant>,
    /// Events arrived while indexing.
    pending: bool,
    in_flight: Option<InFlight>,
    changes: ChangeSet,
    shared: Arc<Mutex<Shared>>,
    notify_tx: mpsc::UnboundedSender<WatcherNotification>,
}

impl<R: Reindex> Controller<R> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::ForceReindex(reply)) => {
                        let outcome = self.force();
                        let _ = reply.send(outcome);
                    }
                    Some(Command::Stop(reply)) => {
                        self.stop();
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        self.stop();
                        break;
                    }
                },
                event = next_event(&mut self.events) => match event {
                    Some(event) => self.on_event(&event),
                    None => {
                        tracing::debug!(root = %self.root.display(), "Event stream closed");
                        self.events = None;
                    }
                },
                () = wait_until(self.deadline), if self.deadline.is_some() && self.in_flight.is_none() => {
                    self.start("debounce");
                }
                result = join_in_flight(&mut self.in_flight) => {
                    self.finish(result);
                }
            }
        }
    }

    fn on_event(&mut self, event: &FileEvent) {
        tracing::trace!(path = %event.path().display(), kind = event.kind(), "Change event");
        self.changes.add(event);

        if self.in_flight.is_some() {
            if !self.pending {
                tracing::debug!(root = %self.root.display(), "Changes during re-index, will re-arm");
            }
            self.pending = true;
            self.shared.lock().status.has_pending_changes = true;
            return;
        }

        self.deadline = Some(Instant::now() + self.debounce);
        self.set_state(WatchState::PendingDebounce);
    }

    fn force(&mut self) -> ForceOutcome {
        if self.in_flight.is_some() {
            tracing::info!(root = %self.root.display(), "Re-index already running, ignoring request");
            return ForceOutcome::AlreadyRunning;
        }
        self.start("manual");
        ForceOutcome::Started
    }

    fn start(&mut self, trigger: &'static str) {
        self.deadline = None;
        self.pending = false;

        tracing::info!(
            root = %self.root.display(),
            trigger,
            changed_paths = self.changes.len(),
            events = self.changes.events(),
            "Re-indexing"
        );
        self.changes.clear();

        let pipeline = Arc::clone(&self.pipeline);
        let root = self.root.clone();
        let task = tokio::task::spawn_blocking(move || pipeline.reindex(&root));
        self.in_flight = Some(InFlight {
            task,
            started: Instant::now(),
        });
        self.set_state(WatchState::Indexing);
    }

    fn finish(&mut self, result: std::result::Result<Result<CodebaseIndex>, JoinError>) {
        let elapsed = self
            .in_flight
            .take()
            .map(|f| f.started.elapsed())
            .unwrap_or_default();

        let notification = match result {
            Ok(Ok(index)) => {
                let index = Arc::new(index);
                tracing::info!(
                    root = %self.root.display(),
                    files = index.file_count,
                    elapsed_ms = elapsed.as_millis(),
                    "Re-index complete"
                );
                let mut shared = self.shared.lock();
                shared.status.indexed_files = index.file_count;
                shared.status.last_indexed = Some(index.last_indexed);
                shared.current = Some(Arc::clone(&index));
                WatcherNotification::Indexed(index)
            }
            Ok(Err(e)) => {
                tracing::warn!(root = %self.root.display(), error = %e, "Re-index failed");
                WatcherNotification::Failed(e.to_string())
            }
            Err(e) => {
                let e = WatcherError::TaskFailed(e.to_string());
                tracing::error!(root = %self.root.display(), error = %e, "Re-index task failed");
                WatcherNotification::Failed(e.to_string())
            }
        };

        if self.pending {
            self.pending = false;
            self.deadline = Some(Instant::now() + self.debounce);
            self.set_state(WatchState::PendingDebounce);
        } else {
            self.set_state(WatchState::Idle);
        }

        let _ = self.notify_tx.send(notification);
    }

    fn stop(&mut self) {
        self.deadline = None;
        self.pending = false;
        self.events = None;
        if self.in_flight.take().is_some() {
            tracing::info!(root = %self.root.display(), "Detaching running re-index");
        }
        self.set_state(WatchState::Stopped);
        tracing::info!(root = %self.root.display(), "Watcher stopped");
    }

    fn set_state(&self, state: WatchState) {
        let mut shared = self.shared.lock();
        let status = &mut shared.status;
        status.state = state;
        status.is_watching = state != WatchState::Stopped;
        status.is_indexing = state == WatchState::Indexing;
        status.has_pending_changes =
            state == WatchState::PendingDebounce || (state == WatchState::Indexing && self.pending);
    }
}

async fn next_event(events: &mut Option<EventStream>) -> Option<FileEvent> {
    match events {
        Some(stream) => stream.recv().await,
        None => pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

async fn join_in_flight(in_flight: &mut Option<InFlight>) -> std::result::Result<Result<CodebaseIndex>, JoinError> {
    match in_flight {
        Some(flight) => (&mut flight.task).await,
        None => pending().await,
    }
}
