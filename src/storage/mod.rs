//! Index persistence.
//!
//! This module provides:
//! - A file-backed store keyed by workspace root
//! - Metadata documents kept separate from per-file content blobs

mod models;
mod store;

pub use models::{FileRecord, IndexDocument, IndexMetadata, DOCUMENT_VERSION};
pub use store::IndexStore;
