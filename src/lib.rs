//! pgconf - a parser and editor for PostgreSQL configuration files.
//!
//! This library parses `postgresql.conf`-style files (`name [=] value
//! [# comment]`, plus `include` / `include_dir` / `include_if_exists`
//! directives), classifies every value into a semantic type, and writes the
//! document back without disturbing lines that were never touched:
//! - [`value`] - the token <-> typed value codec
//! - [`entry`] - a single setting with its provenance
//! - [`parser`] - the line tokenizer
//! - [`include`] - recursive include expansion with cycle detection
//! - [`conf`] - the ordered document model
//!
//! ```no_run
//! use pgconf::Configuration;
//!
//! let mut conf = Configuration::parse_path("/etc/postgresql/postgresql.conf")?;
//! conf.set("listen_addresses", "*")?;
//! let mut out = Vec::new();
//! conf.save(&mut out)?;
//! # Ok::<(), pgconf::Error>(())
//! ```
//!
//! This crate deliberately knows nothing about the GUC catalog: setting names
//! are not validated against real parameters, and values are not checked
//! against a parameter's legal range.

pub mod conf;
pub mod entry;
pub mod include;
pub mod parser;
pub mod value;

pub use conf::Configuration;
pub use entry::Entry;
pub use value::{Value, parse_value};

use std::path::PathBuf;

/// Library-level error type for pgconf operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed value {token:?}: missing quote")]
    MalformedValue { token: String },

    #[error("malformed line {line:?}")]
    MalformedLine { line: String },

    #[error("cannot expand include directives without a base file: try passing a file path")]
    MissingIncludeContext,

    #[error("{kind} '{}', included from '{}', not found", target.display(), including.display())]
    IncludeNotFound {
        /// `"file"` or `"directory"`.
        kind: &'static str,
        target: PathBuf,
        including: PathBuf,
    },

    #[error("include loop detected in '{}'", path.display())]
    IncludeLoop { path: PathBuf },

    #[error("empty string value for '{name}' entry")]
    EmptyValue { name: String },

    #[error("unknown parameter '{name}'")]
    UnknownParameter { name: String },
}

/// Result type alias for pgconf operations.
pub type Result<T> = std::result::Result<T, Error>;
