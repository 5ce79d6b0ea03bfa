//! Index data model.
//!
//! A [`CodebaseIndex`] is one immutable snapshot produced by a single walk.
//! Re-indexing builds a fresh snapshot; nothing is patched in place.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::language::Language;
use super::symbols::Symbol;

/// One indexed source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFile {
    /// Unique within one snapshot. Joins metadata to persisted content.
    /// Not stable across snapshots; use `relative_path` for identity.
    pub id: String,

    /// Absolute path.
    pub path: PathBuf,

    /// Root-relative path with `/` separators.
    pub relative_path: String,

    /// Language classified from the extension.
    pub language: Language,

    /// Full UTF-8 text at index time. Empty if the file was not valid UTF-8.
    pub content: String,

    /// Size in bytes, from the filesystem.
    pub size: u64,

    /// Modification time.
    pub last_modified: DateTime<Utc>,

    /// 32-bit content fingerprint, lowercase hex.
    pub hash: String,

    /// Heuristically extracted symbols, in first-occurrence order.
    pub symbols: Vec<Symbol>,
}

/// Symbol counts across a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSummary {
    pub functions: usize,
    pub classes: usize,
    pub methods: usize,
    pub total_symbols: usize,
}

impl SymbolSummary {
    /// Fold one file's symbols into the counts.
    pub fn record(&mut self, symbols: &[Symbol]) {
        for symbol in symbols {
            match symbol {
                Symbol::Function(_) => self.functions += 1,
                Symbol::Class(_) => self.classes += 1,
                Symbol::Method(_) => self.methods += 1,
            }
        }
        self.total_symbols += symbols.len();
    }
}

/// One full snapshot of a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodebaseIndex {
    pub root_path: PathBuf,
    /// Files in traversal order.
    pub files: Vec<CodeFile>,
    /// Sum of `size` over `files`.
    pub total_size: u64,
    pub file_count: usize,
    /// When the walk began.
    pub last_indexed: DateTime<Utc>,
    /// Files per language. Values sum to `file_count`.
    pub languages: BTreeMap<Language, usize>,
    pub summary: SymbolSummary,
}

impl CodebaseIndex {
    /// Start an empty snapshot for `root_path`.
    #[must_use]
    pub fn new(root_path: impl Into<PathBuf>, last_indexed: DateTime<Utc>) -> Self {
        Self {
            root_path: root_path.into(),
            files: Vec::new(),
            total_size: 0,
            file_count: 0,
            last_indexed,
            languages: BTreeMap::new(),
            summary: SymbolSummary::default(),
        }
    }

    /// Append a file and update the aggregates.
    ///
    /// Only the indexer and the store call this while assembling a snapshot.
    pub(crate) fn push(&mut self, file: CodeFile) {
        self.total_size += file.size;
        self.file_count += 1;
        *self.languages.entry(file.language).or_insert(0) += 1;
        self.summary.record(&file.symbols);
        self.files.push(file);
    }

    /// Look up a file by its root-relative path.
    #[must_use]
    pub fn file(&self, relative_path: &str) -> Option<&CodeFile> {
        self.files.iter().find(|f| f.relative_path == relative_path)
    }
}
