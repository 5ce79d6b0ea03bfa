//! codeindex
//!
//! Walks a project tree into a queryable snapshot of its source files,
//! persists it, and keeps it fresh with debounced re-indexing on change.
//!
//! ```no_run
//! use codeindex::index::{search_files, Indexer};
//!
//! # fn main() -> codeindex::Result<()> {
//! let index = Indexer::default().index(std::path::Path::new("."))?;
//! for file in search_files(&index, "config", 5) {
//!     println!("{}", file.relative_path);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod index;
pub mod observability;
pub mod storage;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
pub use index::{CodeFile, CodebaseIndex, Indexer};
pub use storage::IndexStore;
