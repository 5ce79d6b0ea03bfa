//! Configuration management for codeindex.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - `CODEINDEX_*` environment variables
//! - Built-in defaults (lowest priority)

mod settings;

pub use settings::Config;
