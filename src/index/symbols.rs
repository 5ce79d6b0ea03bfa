//! Heuristic symbol extraction.
//!
//! Symbols are pulled out of file content with per-language regular
//! expressions. This is a best-effort hint for display and search ranking,
//! not a symbol table: matches inside comments or strings are expected, and
//! unusual formatting will be missed. A parser-backed extractor can replace
//! [`RegexSymbolExtractor`] through the [`SymbolExtractor`] trait without
//! touching the indexer.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::language::Language;

/// A tagged symbol name.
///
/// Serialized as `fn:<name>`, `class:<name>` or `method:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbol {
    Function(String),
    Class(String),
    Method(String),
}

impl Symbol {
    /// The bare symbol name without its kind tag.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Function(n) | Self::Class(n) | Self::Method(n) => n,
        }
    }

    /// The kind tag (`fn`, `class` or `method`).
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Function(_) => "fn",
            Self::Class(_) => "class",
            Self::Method(_) => "method",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag(), self.name())
    }
}

impl FromStr for Symbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, name) = s
            .split_once(':')
            .ok_or_else(|| format!("symbol '{s}' has no kind tag"))?;
        if name.is_empty() {
            return Err(format!("symbol '{s}' has an empty name"));
        }
        match tag {
            "fn" => Ok(Self::Function(name.to_string())),
            "class" => Ok(Self::Class(name.to_string())),
            "method" => Ok(Self::Method(name.to_string())),
            other => Err(format!("unknown symbol kind '{other}'")),
        }
    }
}

impl TryFrom<String> for Symbol {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

/// Extracts tagged symbols from file content.
pub trait SymbolExtractor: Send + Sync {
    /// Return symbols in first-occurrence order. Duplicates are allowed.
    fn extract(&self, content: &str, language: Language) -> Vec<Symbol>;
}

#[derive(Clone, Copy)]
enum Kind {
    Function,
    Class,
    Method,
}

impl Kind {
    fn symbol(self, name: &str) -> Symbol {
        let name = name.to_string();
        match self {
            Self::Function => Symbol::Function(name),
            Self::Class => Symbol::Class(name),
            Self::Method => Symbol::Method(name),
        }
    }
}

static JS_FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:async\s+)?function(?:\s*\*\s*|\s+)([A-Za-z_$][\w$]*)\s*\(")
        .expect("valid regex")
});

static JS_FUNCTION_BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^()]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)",
    )
    .expect("valid regex")
});

static JS_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+([A-Za-z_$][\w$]*)").expect("valid regex"));

static PY_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdef\s+([A-Za-z_]\w*)\s*\(").expect("valid regex"));

static PY_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+([A-Za-z_]\w*)").expect("valid regex"));

static OOP_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:class|interface)\s+([A-Za-z_]\w*)").expect("valid regex"));

static OOP_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?:public|private|protected|internal|static|final|abstract|virtual|override|async|synchronized|sealed)\s+)*([A-Za-z_][\w<>\[\],.?]*)\s+([A-Za-z_]\w*)\s*\(",
    )
    .expect("valid regex")
});

/// Words that look like a return type in `word name(` but are not one.
///
/// A lone modifier in that position means a constructor, which is skipped.
const NOT_A_RETURN_TYPE: &[&str] = &[
    "return", "new", "else", "throw", "await", "yield", "case", "goto", "using", "import",
    "package", "class", "interface", "public", "private", "protected", "internal", "static",
];

/// Default regex-based extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexSymbolExtractor;

impl RegexSymbolExtractor {
    /// Create the extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SymbolExtractor for RegexSymbolExtractor {
    fn extract(&self, content: &str, language: Language) -> Vec<Symbol> {
        let mut found: Vec<(usize, Symbol)> = Vec::new();

        match language {
            Language::JavaScript | Language::TypeScript => {
                collect(&mut found, &JS_FUNCTION_DECL, content, Kind::Function);
                collect(&mut found, &JS_FUNCTION_BINDING, content, Kind::Function);
                collect(&mut found, &JS_CLASS, content, Kind::Class);
            }
            Language::Python => {
                collect(&mut found, &PY_DEF, content, Kind::Function);
                collect(&mut found, &PY_CLASS, content, Kind::Class);
            }
            Language::Java | Language::CSharp => {
                collect(&mut found, &OOP_TYPE, content, Kind::Class);
                for caps in OOP_METHOD.captures_iter(content) {
                    let (Some(ret), Some(name)) = (caps.get(1), caps.get(2)) else {
                        continue;
                    };
                    if NOT_A_RETURN_TYPE.contains(&ret.as_str()) {
                        continue;
                    }
                    found.push((name.start(), Kind::Method.symbol(name.as_str())));
                }
            }
            _ => return Vec::new(),
        }

        // Stable sort keeps pattern order for matches at the same offset.
        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, symbol)| symbol).collect()
    }
}

fn collect(found: &mut Vec<(usize, Symbol)>, re: &Regex, content: &str, kind: Kind) {
    for caps in re.captures_iter(content) {
        if let Some(name) = caps.get(1) {
            found.push((name.start(), kind.symbol(name.as_str())));
        }
    }
}
