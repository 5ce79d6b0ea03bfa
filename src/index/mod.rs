//! Codebase indexing.
//!
//! This module provides:
//! - The snapshot data model ([`CodebaseIndex`], [`CodeFile`])
//! - Ignore policy evaluation with built-in deny lists and ignore-file globs
//! - Heuristic, per-language symbol extraction
//! - The directory walker that assembles a snapshot
//! - Read-only queries over a snapshot

mod filter;
mod indexer;
mod language;
mod models;
mod query;
mod symbols;

pub use filter::{has_ignored_dir, Decision, IgnorePolicy};
pub use indexer::{
    fingerprint, relative_path, IndexProgress, Indexer, IndexerConfig, ProgressSender,
    DEFAULT_IGNORE_FILE, DEFAULT_MAX_FILE_SIZE,
};
pub use language::Language;
pub use models::{CodeFile, CodebaseIndex, SymbolSummary};
pub use query::{file_context, files_by_language, index_summary, search_files, symbols_by_file};
pub use symbols::{RegexSymbolExtractor, Symbol, SymbolExtractor};
