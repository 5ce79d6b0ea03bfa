//! File-backed Index Store.
//!
//! Layout under the base directory, per workspace key:
//!
//! ```text
//! <key>.json          metadata document (no file content)
//! <key>/<id>.txt      one content blob per file
//! ```
//!
//! Saving is two-phase and not crash-atomic as a whole: blobs are written
//! first, then the metadata document (atomically, via rename), then blobs no
//! longer referenced are pruned. A crash can leave orphan blobs, which the
//! next save removes.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::models::{IndexDocument, IndexMetadata};
use crate::error::StorageError;
use crate::index::CodebaseIndex;
use crate::Result;

const BLOB_EXTENSION: &str = "txt";

/// Persists snapshots as a metadata document plus content blobs.
///
/// Callers must serialize `save`/`load` for the same workspace root.
#[derive(Debug, Clone)]
pub struct IndexStore {
    base_dir: PathBuf,
}

impl IndexStore {
    /// Open a store rooted at `base_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        create_dir(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Storage key for a workspace root: its directory name with every
    /// non-alphanumeric character replaced by `_`.
    ///
    /// The name is taken from the canonical path when `root` exists, so `.`
    /// and `..` key by the directory they point at.
    #[must_use]
    pub fn workspace_key(root: &Path) -> String {
        let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let name = canonical
            .file_name()
            .map_or_else(|| "root".into(), |n| n.to_string_lossy());
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }

    fn metadata_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    fn content_dir(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }

    /// Persist a snapshot, replacing whatever was stored for `root`.
    ///
    /// Every blob is attempted before the metadata document is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directories cannot be created, if the
    /// metadata document cannot be written, or
    /// [`StorageError::PartialSave`] if some blobs failed (metadata is still
    /// written in that case and `load` yields empty content for them).
    pub fn save(&self, root: &Path, index: &CodebaseIndex) -> Result<()> {
        let key = Self::workspace_key(root);
        let content_dir = self.content_dir(&key);
        create_dir(&content_dir)?;

        let mut failed = 0usize;
        for file in &index.files {
            let Some(blob) = blob_path(&content_dir, &file.id) else {
                tracing::warn!(id = %file.id, "Refusing to write blob for unsafe file id");
                failed += 1;
                continue;
            };
            if let Err(e) = fs::write(&blob, file.content.as_bytes()) {
                tracing::warn!(
                    path = %blob.display(),
                    file = %file.relative_path,
                    error = %e,
                    "Failed to write content blob"
                );
                failed += 1;
            }
        }

        let document = IndexDocument::from_index(index);
        let json = serde_json::to_vec(&document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        write_atomic(&self.metadata_path(&key), &json)?;

        let keep: HashSet<&str> = index.files.iter().map(|f| f.id.as_str()).collect();
        let pruned = prune_blobs(&content_dir, &keep);

        tracing::info!(
            key = %key,
            files = index.file_count,
            failed,
            pruned,
            "Saved index"
        );

        if failed > 0 {
            return Err(StorageError::PartialSave {
                failed,
                total: index.files.len(),
            }
            .into());
        }
        Ok(())
    }

    /// Load the snapshot stored for `root`.
    ///
    /// Returns `None` if nothing is stored or the metadata document is
    /// unreadable as JSON. Missing or unreadable blobs load as empty content.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata document exists but cannot be read.
    pub fn load(&self, root: &Path) -> Result<Option<CodebaseIndex>> {
        let key = Self::workspace_key(root);
        let Some(document) = self.read_document::<IndexDocument>(&key)? else {
            return Ok(None);
        };

        let content_dir = self.content_dir(&key);
        let meta = document.metadata;
        let mut index = CodebaseIndex::new(meta.root_path, meta.last_indexed);
        let mut missing = 0usize;

        for record in document.files {
            let content = blob_path(&content_dir, &record.id)
                .and_then(|blob| fs::read_to_string(blob).ok())
                .unwrap_or_else(|| {
                    missing += 1;
                    String::new()
                });
            index.push(record.into_file(content));
        }

        if missing > 0 {
            tracing::warn!(key = %key, missing, "Loaded index with missing content blobs");
        }
        tracing::debug!(key = %key, files = index.file_count, "Loaded index");

        Ok(Some(index))
    }

    /// Aggregate facts for the snapshot stored for `root`, without content.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata document exists but cannot be read.
    pub fn metadata(&self, root: &Path) -> Result<Option<IndexMetadata>> {
        self.read_document::<IndexMetadata>(&Self::workspace_key(root))
    }

    /// Remove everything stored for `root`. Succeeds if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if existing data cannot be removed.
    pub fn delete(&self, root: &Path) -> Result<()> {
        let key = Self::workspace_key(root);

        let metadata = self.metadata_path(&key);
        match fs::remove_file(&metadata) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::write(&metadata, e).into()),
        }

        let content_dir = self.content_dir(&key);
        match fs::remove_dir_all(&content_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::write(&content_dir, e).into()),
        }

        tracing::info!(key = %key, "Deleted stored index");
        Ok(())
    }

    fn read_document<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.metadata_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::read(&path, e).into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(document) => Ok(Some(document)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable index metadata");
                Ok(None)
            }
        }
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        StorageError::CreateDir {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Blob path for a file id, or `None` if the id is not a plain file name.
fn blob_path(content_dir: &Path, id: &str) -> Option<PathBuf> {
    let safe = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    safe.then(|| content_dir.join(format!("{id}.{BLOB_EXTENSION}")))
}

/// Write via a sibling temp file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|e| StorageError::write(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StorageError::write(path, e)
    })?;
    Ok(())
}

/// Remove blobs whose id is not in `keep`. Returns how many were removed.
fn prune_blobs(content_dir: &Path, keep: &HashSet<&str>) -> usize {
    let entries = match fs::read_dir(content_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %content_dir.display(), error = %e, "Cannot list content blobs");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if keep.contains(stem) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "Failed to prune blob"),
        }
    }
    removed
}
