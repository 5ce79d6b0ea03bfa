//! Directory walker that builds a [`CodebaseIndex`] snapshot.
//!
//! Every run is a full re-walk. Per-entry failures are logged and skipped;
//! only an unusable root aborts the walk.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use walkdir::{DirEntry, WalkDir};

use super::filter::IgnorePolicy;
use super::language::Language;
use super::models::{CodeFile, CodebaseIndex};
use super::symbols::{RegexSymbolExtractor, SymbolExtractor};
use crate::error::IndexError;
use crate::Result;

/// Files larger than this are skipped entirely.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500 * 1024;

/// Ignore file read from the root at the start of each walk.
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// A progress update is sent after this many indexed files.
const PROGRESS_INTERVAL: u64 = 50;

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Size ceiling in bytes.
    pub max_file_size: u64,
    /// Ignore file name, relative to the root.
    pub ignore_file: String,
    /// Paths pruned from every walk, such as the index store's own directory.
    pub exclude_paths: Vec<PathBuf>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            exclude_paths: Vec::new(),
        }
    }
}

/// Progress update emitted during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexProgress {
    /// Human-readable status line.
    pub message: String,
    /// Files indexed since the previous update.
    pub increment: u64,
    /// Files indexed so far. Never decreases within one walk.
    pub processed: u64,
}

/// Channel half that receives [`IndexProgress`] updates.
pub type ProgressSender = mpsc::UnboundedSender<IndexProgress>;

#[derive(Debug, Default)]
struct WalkStats {
    files_seen: u64,
    oversized: u64,
    unsupported: u64,
    errors: u64,
}

enum Outcome {
    Indexed(CodeFile),
    Oversized(u64),
    Unsupported,
}

/// Builds index snapshots.
///
/// Clone is cheap; the extractor is shared.
#[derive(Clone)]
pub struct Indexer {
    config: IndexerConfig,
    extractor: Arc<dyn SymbolExtractor>,
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new(IndexerConfig::default())
    }
}

impl Indexer {
    /// Create an indexer using the regex symbol heuristics.
    #[must_use]
    pub fn new(config: IndexerConfig) -> Self {
        Self {
            config,
            extractor: Arc::new(RegexSymbolExtractor::new()),
        }
    }

    /// Replace the symbol extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn SymbolExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Index `root` without progress reporting.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing, unreadable or not a directory.
    pub fn index(&self, root: &Path) -> Result<CodebaseIndex> {
        self.index_with_progress(root, None)
    }

    /// Index `root`, sending progress updates to `progress` if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing, unreadable or not a directory.
    pub fn index_with_progress(
        &self,
        root: &Path,
        progress: Option<&ProgressSender>,
    ) -> Result<CodebaseIndex> {
        let started = Utc::now();
        let root = resolve_root(root)?;
        let policy = IgnorePolicy::load(&root, &self.config.ignore_file);
        // The root is canonical, so compare against canonical exclusions.
        let exclude_paths: Vec<PathBuf> = self
            .config
            .exclude_paths
            .iter()
            .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
            .collect();

        tracing::info!(
            path = %root.display(),
            ignore_patterns = policy.pattern_count(),
            "Starting index walk"
        );
        report(progress, format!("Indexing {}", root.display()), 0, 0);

        let mut index = CodebaseIndex::new(&root, started);
        let mut stats = WalkStats::default();
        let excluded = Cell::new(0u64);
        let mut since_report = 0u64;

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                let relative = relative_path(&root, entry.path());
                let keep = !exclude_paths.iter().any(|p| entry.path().starts_with(p))
                    && !policy.is_excluded(&name, &relative, entry.file_type().is_dir());
                if !keep {
                    excluded.set(excluded.get() + 1);
                }
                keep
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    stats.errors += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            stats.files_seen += 1;

            match self.index_entry(&root, &entry, started) {
                Ok(Outcome::Indexed(file)) => {
                    index.push(file);
                    since_report += 1;
                    if since_report == PROGRESS_INTERVAL {
                        let processed = index.file_count as u64;
                        report(
                            progress,
                            format!("Indexed {processed} files"),
                            since_report,
                            processed,
                        );
                        since_report = 0;
                    }
                }
                Ok(Outcome::Oversized(size)) => {
                    tracing::debug!(path = %entry.path().display(), size, "Skipping oversized file");
                    stats.oversized += 1;
                }
                Ok(Outcome::Unsupported) => stats.unsupported += 1,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "Skipping file");
                    stats.errors += 1;
                }
            }
        }

        report(
            progress,
            format!("Indexed {} files", index.file_count),
            since_report,
            index.file_count as u64,
        );

        tracing::info!(
            path = %root.display(),
            files = index.file_count,
            total_size = index.total_size,
            seen = stats.files_seen,
            excluded = excluded.get(),
            oversized = stats.oversized,
            unsupported = stats.unsupported,
            errors = stats.errors,
            "Index walk complete"
        );

        Ok(index)
    }

    /// Run [`Self::index_with_progress`] on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the walk fails to start or the task panics.
    pub async fn index_async(
        &self,
        root: PathBuf,
        progress: Option<ProgressSender>,
    ) -> Result<CodebaseIndex> {
        let indexer = self.clone();
        tokio::task::spawn_blocking(move || indexer.index_with_progress(&root, progress.as_ref()))
            .await
            .map_err(|e| crate::Error::internal(format!("Index task failed: {e}")))?
    }

    fn index_entry(
        &self,
        root: &Path,
        entry: &DirEntry,
        started: DateTime<Utc>,
    ) -> std::io::Result<Outcome> {
        let metadata = entry.metadata().map_err(std::io::Error::other)?;
        let size = metadata.len();
        if size > self.config.max_file_size {
            return Ok(Outcome::Oversized(size));
        }

        let path = entry.path();
        let Some(language) = Language::from_path(path) else {
            return Ok(Outcome::Unsupported);
        };

        let bytes = fs::read(path)?;
        let content = String::from_utf8(bytes).unwrap_or_else(|_| {
            tracing::debug!(path = %path.display(), "File is not valid UTF-8, indexing without content");
            String::new()
        });

        let symbols = self.extractor.extract(&content, language);
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or(started);

        Ok(Outcome::Indexed(CodeFile {
            id: uuid::Uuid::new_v4().to_string(),
            path: path.to_path_buf(),
            relative_path: relative_path(root, path),
            language,
            hash: fingerprint(&content),
            content,
            size,
            last_modified,
            symbols,
        }))
    }
}

/// 32-bit rolling hash over UTF-16 code units (`h = h * 31 + c`, wrapping).
///
/// A change-detection hint only; collisions are expected.
#[must_use]
pub fn fingerprint(content: &str) -> String {
    let hash = content.encode_utf16().fold(0u32, |h, unit| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(u32::from(unit))
    });
    format!("{hash:08x}")
}

/// Root-relative path with `/` separators.
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    let unavailable = |e: std::io::Error| IndexError::RootUnavailable {
        path: root.display().to_string(),
        reason: e.to_string(),
    };

    let metadata = fs::metadata(root).map_err(unavailable)?;
    if !metadata.is_dir() {
        return Err(IndexError::NotADirectory(root.display().to_string()).into());
    }
    fs::read_dir(root).map_err(unavailable)?;
    root.canonicalize()
        .map_err(|e| crate::Error::from(unavailable(e)))
}

fn report(progress: Option<&ProgressSender>, message: String, increment: u64, processed: u64) {
    if let Some(tx) = progress {
        // A dropped receiver only means nobody is listening.
        let _ = tx.send(IndexProgress {
            message,
            increment,
            processed,
        });
    }
}
