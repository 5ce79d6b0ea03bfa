//! On-disk document shapes for persisted snapshots.
//!
//! The metadata document carries everything except file content. Content
//! lives in one blob per file, named by the file's id.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::index::{CodeFile, CodebaseIndex, Language, Symbol, SymbolSummary};

/// Current metadata document version.
pub const DOCUMENT_VERSION: u32 = 1;

/// A file record without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub path: PathBuf,
    pub relative_path: String,
    pub language: Language,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub hash: String,
    pub symbols: Vec<Symbol>,
}

impl FileRecord {
    /// Strip content from a file.
    #[must_use]
    pub fn from_file(file: &CodeFile) -> Self {
        Self {
            id: file.id.clone(),
            path: file.path.clone(),
            relative_path: file.relative_path.clone(),
            language: file.language,
            size: file.size,
            last_modified: file.last_modified,
            hash: file.hash.clone(),
            symbols: file.symbols.clone(),
        }
    }

    /// Reattach content.
    #[must_use]
    pub fn into_file(self, content: String) -> CodeFile {
        CodeFile {
            id: self.id,
            path: self.path,
            relative_path: self.relative_path,
            language: self.language,
            content,
            size: self.size,
            last_modified: self.last_modified,
            hash: self.hash,
            symbols: self.symbols,
        }
    }
}

/// Aggregate facts about a persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMetadata {
    pub root_path: PathBuf,
    pub file_count: usize,
    pub total_size: u64,
    pub last_indexed: DateTime<Utc>,
    pub languages: BTreeMap<Language, usize>,
    pub summary: SymbolSummary,
}

/// The per-workspace metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub version: u32,
    #[serde(flatten)]
    pub metadata: IndexMetadata,
    pub files: Vec<FileRecord>,
}

impl IndexDocument {
    /// Build the document for a snapshot.
    #[must_use]
    pub fn from_index(index: &CodebaseIndex) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            metadata: IndexMetadata {
                root_path: index.root_path.clone(),
                file_count: index.file_count,
                total_size: index.total_size,
                last_indexed: index.last_indexed,
                languages: index.languages.clone(),
                summary: index.summary,
            },
            files: index.files.iter().map(FileRecord::from_file).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trip_drops_content_only() {
        let file = CodeFile {
            id: "abc".to_string(),
            path: PathBuf::from("/ws/a.py"),
            relative_path: "a.py".to_string(),
            language: Language::Python,
            content: "def foo():\n    pass\n".to_string(),
            size: 20,
            last_modified: Utc::now(),
            hash: "deadbeef".to_string(),
            symbols: vec![Symbol::Function("foo".to_string())],
        };

        let record = FileRecord::from_file(&file);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["relativePath"], "a.py");

        assert_eq!(record.into_file(file.content.clone()), file);
    }

    #[test]
    fn test_document_flattens_metadata() {
        let index = CodebaseIndex::new("/ws", Utc::now());
        let json = serde_json::to_value(IndexDocument::from_index(&index)).unwrap();
        assert_eq!(json["version"], DOCUMENT_VERSION);
        assert_eq!(json["rootPath"], "/ws");
        assert_eq!(json["fileCount"], 0);
        assert!(json["files"].as_array().unwrap().is_empty());
    }
}
