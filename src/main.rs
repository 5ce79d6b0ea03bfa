//! codeindex - codebase indexing CLI
//!
//! Entry point for the `codeindex` binary.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use codeindex::error::WatcherError;
use codeindex::index::{
    file_context, files_by_language, index_summary, search_files, symbols_by_file,
    CodebaseIndex, Indexer, Language,
};
use codeindex::observability::init_tracing;
use codeindex::watcher::{
    self, EventStream, ForceOutcome, IndexPipeline, WatcherNotification, DEFAULT_EVENT_CAPACITY,
};
use codeindex::{Config, IndexStore};
use tokio::sync::mpsc;

/// codeindex - index, search and watch a codebase
#[derive(Parser, Debug)]
#[command(name = "codeindex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory for persisted indexes
    #[arg(short, long, global = true, env = "CODEINDEX_DATA_DIR", default_value = "./.codeindex")]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "CODEINDEX_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, global = true, env = "CODEINDEX_LOG_JSON")]
    log_json: bool,

    /// Quiet period in milliseconds before re-indexing on change
    #[arg(long, global = true, env = "CODEINDEX_DEBOUNCE_MS", default_value = "5000")]
    debounce_ms: u64,

    /// Files larger than this many bytes are skipped
    #[arg(long, global = true, env = "CODEINDEX_MAX_FILE_SIZE", default_value = "512000")]
    max_file_size: u64,

    /// Ignore file name looked up at the root
    #[arg(long, global = true, env = "CODEINDEX_IGNORE_FILE", default_value = ".gitignore")]
    ignore_file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index a directory and save the snapshot
    Index { root: PathBuf },

    /// Index a directory, then re-index on change until interrupted
    Watch { root: PathBuf },

    /// Search paths, symbols and content
    Search {
        root: PathBuf,
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Print a summary of the snapshot
    Summary { root: PathBuf },

    /// List indexed files, optionally of one language
    Files {
        root: PathBuf,
        /// Only list files of this language (e.g. python, typescript)
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Print the indexed content of one file
    Show { root: PathBuf, path: String },

    /// List extracted symbols per file
    Symbols { root: PathBuf },

    /// Delete the saved snapshot
    Delete { root: PathBuf },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            data_dir: self.data_dir.clone(),
            log_level: self.log_level.clone(),
            log_json: self.log_json,
            debounce: Duration::from_millis(self.debounce_ms),
            max_file_size: self.max_file_size,
            ignore_file: self.ignore_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config();
    config.validate()?;

    init_tracing(&config.log_level, config.log_json);
    tracing::debug!(?config, "Configuration loaded");

    let store = IndexStore::open(&config.data_dir)
        .with_context(|| format!("cannot open store at {}", config.data_dir.display()))?;
    let indexer = Indexer::new(config.indexer_config());

    match cli.command {
        Command::Index { root } => {
            let root = resolve(&root)?;
            let index = index_and_save(&indexer, &store, &root).await?;
            println!("{}", index_summary(&index));
        }
        Command::Watch { root } => {
            let root = resolve(&root)?;
            watch(&config, indexer, store, root).await?;
        }
        Command::Search { root, query, limit } => {
            let index = load_or_index(&indexer, &store, &resolve(&root)?).await?;
            let hits = search_files(&index, &query, limit);
            if hits.is_empty() {
                println!("No matches for '{query}'");
            }
            for file in hits {
                println!("{} ({})", file.relative_path, file.language);
            }
        }
        Command::Summary { root } => {
            let index = load_or_index(&indexer, &store, &resolve(&root)?).await?;
            println!("{}", index_summary(&index));
        }
        Command::Files { root, language } => {
            let index = load_or_index(&indexer, &store, &resolve(&root)?).await?;
            let files = match language {
                Some(language) => files_by_language(&index, language),
                None => index.files.iter().collect(),
            };
            for file in files {
                println!("{} ({}, {} bytes)", file.relative_path, file.language, file.size);
            }
        }
        Command::Show { root, path } => {
            let index = load_or_index(&indexer, &store, &resolve(&root)?).await?;
            let content = file_context(&index, &path)
                .with_context(|| format!("'{path}' is not in the index"))?;
            print!("{content}");
        }
        Command::Symbols { root } => {
            let index = load_or_index(&indexer, &store, &resolve(&root)?).await?;
            for (path, symbols) in symbols_by_file(&index) {
                let list = symbols
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{path}: {list}");
            }
        }
        Command::Delete { root } => {
            store.delete(&resolve(&root)?)?;
            println!("Deleted saved index for {}", root.display());
        }
    }

    Ok(())
}

fn resolve(root: &Path) -> anyhow::Result<PathBuf> {
    root.canonicalize()
        .with_context(|| format!("cannot resolve {}", root.display()))
}

async fn index_and_save(
    indexer: &Indexer,
    store: &IndexStore,
    root: &Path,
) -> anyhow::Result<CodebaseIndex> {
    let (tx, mut rx) = mpsc::unbounded_channel::<codeindex::index::IndexProgress>();
    let reporter = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            tracing::info!(processed = progress.processed, "{}", progress.message);
        }
    });

    let index = indexer.index_async(root.to_path_buf(), Some(tx)).await?;
    let _ = reporter.await;

    store
        .save(root, &index)
        .with_context(|| format!("index of {} built but not saved", root.display()))?;
    Ok(index)
}

async fn load_or_index(
    indexer: &Indexer,
    store: &IndexStore,
    root: &Path,
) -> anyhow::Result<CodebaseIndex> {
    if let Some(index) = store.load(root)? {
        return Ok(index);
    }
    tracing::info!(root = %root.display(), "No saved index, indexing now");
    index_and_save(indexer, store, root).await
}

async fn watch(config: &Config, indexer: Indexer, store: IndexStore, root: PathBuf) -> anyhow::Result<()> {
    let initial = store.load(&root)?.map(Arc::new);
    let events = EventStream::watch(&root, &[config.data_dir.clone()], DEFAULT_EVENT_CAPACITY)?;
    let pipeline = Arc::new(IndexPipeline::new(indexer, store));

    let (handle, mut notifications) =
        watcher::spawn(root, pipeline, events, &config.watcher_config(), initial);
    if handle.force_reindex().await == ForceOutcome::Stopped {
        return Err(WatcherError::Stopped.into());
    }

    loop {
        tokio::select! {
            notification = notifications.recv() => match notification {
                Some(WatcherNotification::Indexed(index)) => {
                    println!(
                        "Indexed {} files ({} symbols)",
                        index.file_count, index.summary.total_symbols
                    );
                }
                Some(WatcherNotification::Failed(message)) => {
                    eprintln!("Indexing failed: {message}");
                }
                None => break,
            },
            result = tokio::signal::ctrl_c() => {
                result.context("cannot listen for ctrl-c")?;
                tracing::info!("Interrupted, stopping watcher");
                handle.stop().await;
                break;
            }
        }
    }

    Ok(())
}
