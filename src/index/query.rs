//! Read-only queries over a snapshot.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::language::Language;
use super::models::{CodeFile, CodebaseIndex};
use super::symbols::Symbol;

const PATH_SCORE: u32 = 3;
const SYMBOL_SCORE: u32 = 2;
const CONTENT_SCORE: u32 = 1;

/// Human-readable summary of a snapshot.
#[must_use]
pub fn index_summary(index: &CodebaseIndex) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Codebase: {}", index.root_path.display());
    let _ = writeln!(
        out,
        "Files: {} ({})",
        index.file_count,
        format_size(index.total_size)
    );

    if index.languages.is_empty() {
        let _ = writeln!(out, "Languages: none");
    } else {
        let mut languages: Vec<_> = index.languages.iter().collect();
        // Most common first, ties by name.
        languages.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        let list = languages
            .iter()
            .map(|(lang, count)| format!("{lang} ({count})"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Languages: {list}");
    }

    let summary = &index.summary;
    let _ = writeln!(
        out,
        "Symbols: {} functions, {} classes, {} methods ({} total)",
        summary.functions, summary.classes, summary.methods, summary.total_symbols
    );
    let _ = write!(
        out,
        "Last indexed: {}",
        index.last_indexed.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out
}

/// Case-insensitive substring search over paths, symbol names and content.
///
/// Path matches rank above symbol matches, which rank above content matches.
/// Equal scores keep traversal order. An empty query matches nothing.
#[must_use]
pub fn search_files<'a>(index: &'a CodebaseIndex, query: &str, limit: usize) -> Vec<&'a CodeFile> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(u32, &CodeFile)> = index
        .files
        .iter()
        .filter_map(|file| {
            let score = score(file, &needle);
            (score > 0).then_some((score, file))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, f)| f).collect()
}

fn score(file: &CodeFile, needle: &str) -> u32 {
    let mut score = 0;
    if file.relative_path.to_lowercase().contains(needle) {
        score += PATH_SCORE;
    }
    if file
        .symbols
        .iter()
        .any(|s| s.name().to_lowercase().contains(needle))
    {
        score += SYMBOL_SCORE;
    }
    if file.content.to_lowercase().contains(needle) {
        score += CONTENT_SCORE;
    }
    score
}

/// Files of one language, in traversal order.
#[must_use]
pub fn files_by_language(index: &CodebaseIndex, language: Language) -> Vec<&CodeFile> {
    index
        .files
        .iter()
        .filter(|f| f.language == language)
        .collect()
}

/// Content of a file addressed by absolute or root-relative path.
///
/// Backslashes in `path` are accepted as separators.
#[must_use]
pub fn file_context<'a>(index: &'a CodebaseIndex, path: &str) -> Option<&'a str> {
    let normalized = path.replace('\\', "/");
    let relative = normalized.trim_start_matches("./");

    index
        .files
        .iter()
        .find(|f| {
            f.relative_path == relative
                || f.path.to_string_lossy().replace('\\', "/") == normalized
        })
        .map(|f| f.content.as_str())
}

/// Symbols keyed by relative path. Files without symbols are omitted.
#[must_use]
pub fn symbols_by_file(index: &CodebaseIndex) -> BTreeMap<&str, &[Symbol]> {
    index
        .files
        .iter()
        .filter(|f| !f.symbols.is_empty())
        .map(|f| (f.relative_path.as_str(), f.symbols.as_slice()))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
