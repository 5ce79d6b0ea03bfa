//! The re-index step run by the watcher.

use std::path::Path;

use crate::index::{CodebaseIndex, Indexer};
use crate::storage::IndexStore;
use crate::Result;

/// Produces a fresh snapshot for a root. Called on a blocking thread.
pub trait Reindex: Send + Sync + 'static {
    /// Walk `root` and return the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be built or persisted.
    fn reindex(&self, root: &Path) -> Result<CodebaseIndex>;
}

/// Full walk followed by a save to the store.
#[derive(Debug, Clone)]
pub struct IndexPipeline {
    indexer: Indexer,
    store: IndexStore,
}

impl IndexPipeline {
    /// Create a pipeline.
    #[must_use]
    pub const fn new(indexer: Indexer, store: IndexStore) -> Self {
        Self { indexer, store }
    }
}

impl Reindex for IndexPipeline {
    fn reindex(&self, root: &Path) -> Result<CodebaseIndex> {
        let index = self.indexer.index(root)?;
        self.store.save(root, &index)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_pipeline_indexes_and_persists() {
        let ws = TempDir::new().unwrap();
        fs::write(ws.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        let data = TempDir::new().unwrap();
        let store = IndexStore::open(data.path()).unwrap();

        let pipeline = IndexPipeline::new(Indexer::default(), store.clone());
        let index = pipeline.reindex(ws.path()).unwrap();

        assert_eq!(index.file_count, 1);
        let stored = store.metadata(ws.path()).unwrap().unwrap();
        assert_eq!(stored.file_count, 1);
    }

    #[test]
    fn test_pipeline_surfaces_root_errors() {
        let data = TempDir::new().unwrap();
        let store = IndexStore::open(data.path()).unwrap();
        let pipeline = IndexPipeline::new(Indexer::default(), store);

        assert!(pipeline.reindex(Path::new("/nonexistent/root")).is_err());
    }
}
