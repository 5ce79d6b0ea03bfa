//! File system watching and debounced re-indexing.
//!
//! This module provides:
//! - Change events from notify-rs, filtered by the built-in deny lists
//! - A per-root state machine that coalesces bursts of events into one
//!   full re-index at a time
//! - The re-index seam ([`Reindex`]) with a walk-and-save implementation

mod controller;
mod events;
mod pipeline;
mod source;

pub use controller::{
    spawn, ForceOutcome, WatchState, WatcherConfig, WatcherHandle, WatcherNotification,
    WatcherStatus, DEFAULT_DEBOUNCE,
};
pub use events::{ChangeSet, FileEvent};
pub use pipeline::{IndexPipeline, Reindex};
pub use source::{EventStream, DEFAULT_EVENT_CAPACITY};
