//! Ignore policy: built-in deny lists plus ignore-file patterns.

use std::path::Path;

use regex::Regex;

/// File names that are never indexed.
const IGNORED_FILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Cargo.lock",
    "Gemfile.lock",
    "poetry.lock",
    "Pipfile.lock",
    "composer.lock",
    "go.sum",
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
];

/// Directory names excluded at any depth.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "bower_components",
    ".git",
    ".svn",
    ".hg",
    ".vscode",
    ".idea",
    ".vs",
    "dist",
    "build",
    "out",
    "target",
    "bin",
    "obj",
    "coverage",
    ".next",
    ".nuxt",
    ".cache",
    ".gradle",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    ".venv",
    "venv",
    ".codeindex",
];

/// Outcome of evaluating a path against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Include,
    Exclude,
}

/// Compiled ignore-file pattern.
#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    regex: Option<Regex>,
}

/// Decides which paths are excluded from indexing.
///
/// Rules are checked in order and the first match wins: deny-listed file
/// names, deny-listed directory names in any path segment, then patterns read
/// from the project's ignore file.
#[derive(Debug, Clone, Default)]
pub struct IgnorePolicy {
    patterns: Vec<Pattern>,
}

impl IgnorePolicy {
    /// Policy with the built-in deny lists only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load patterns from `root/<ignore_file>`.
    ///
    /// A missing or unreadable ignore file yields the built-in policy.
    pub fn load(root: &Path, ignore_file: &str) -> Self {
        let path = root.join(ignore_file);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let policy = Self::from_patterns(text.lines());
                tracing::debug!(
                    path = %path.display(),
                    patterns = policy.patterns.len(),
                    "Loaded ignore file"
                );
                policy
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read ignore file");
                Self::new()
            }
        }
    }

    /// Build a policy from ignore-file lines.
    ///
    /// Blank lines and `#` comments are skipped. Negated (`!`) patterns are
    /// not supported and are skipped. Leading and trailing `/` are trimmed.
    pub fn from_patterns<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let patterns = lines
            .into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('!'))
            .map(|l| l.trim_matches('/'))
            .filter(|l| !l.is_empty())
            .map(|l| Pattern {
                source: l.to_string(),
                regex: compile_glob(l),
            })
            .collect();

        Self { patterns }
    }

    /// Number of ignore-file patterns, including ones that failed to compile.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Evaluate an entry.
    ///
    /// `relative_path` is root-relative; backslashes are treated as separators.
    #[must_use]
    pub fn evaluate(&self, name: &str, relative_path: &str, is_dir: bool) -> Decision {
        if !is_dir && IGNORED_FILES.contains(&name) {
            return Decision::Exclude;
        }

        let normalized = relative_path.replace('\\', "/");

        if has_ignored_dir(&normalized) {
            return Decision::Exclude;
        }

        if self
            .patterns
            .iter()
            .filter_map(|p| p.regex.as_ref())
            .any(|re| re.is_match(&normalized))
        {
            return Decision::Exclude;
        }

        Decision::Include
    }

    /// Convenience wrapper returning `true` when the entry is excluded.
    #[must_use]
    pub fn is_excluded(&self, name: &str, relative_path: &str, is_dir: bool) -> bool {
        self.evaluate(name, relative_path, is_dir) == Decision::Exclude
    }

    /// Patterns as written in the ignore file.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.source.as_str())
    }
}

/// Check whether any segment of a path is a deny-listed directory name.
///
/// The last segment counts too, so a directory entry named `node_modules` is
/// excluded before it is descended into.
#[must_use]
pub fn has_ignored_dir(path: &str) -> bool {
    path.split(['/', '\\'])
        .any(|segment| IGNORED_DIRS.contains(&segment))
}

/// Translate a glob into an anchored regex.
///
/// `**` matches across separators, `*` within one segment, `?` one character,
/// and `.` is literal. Anything else passes through, so a pattern that is not
/// a valid regex afterwards compiles to `None` and never matches.
fn compile_glob(glob: &str) -> Option<Regex> {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');

    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push('.'),
            '.' => out.push_str("\\."),
            other => out.push(other),
        }
    }
    out.push('$');

    match Regex::new(&out) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!(pattern = glob, error = %e, "Ignoring malformed ignore pattern");
            None
        }
    }
}
