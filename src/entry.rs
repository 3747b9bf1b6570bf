//! A single configuration setting and its provenance.

use serde::Serialize;
use std::fmt;

use crate::value::Value;
use crate::{Error, Result};

/// One `name = value` occurrence in a configuration document.
///
/// Entries that came from a file keep their verbatim source line so an
/// untouched setting saves back byte-identical; entries created or
/// reassigned through the API carry no source line and are rendered
/// canonically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    name: String,
    value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip)]
    source: Option<String>,
}

impl Entry {
    /// Create an entry. An empty string value is rejected: it would render
    /// as `name = ''`, which the server reads as a syntax error for most
    /// parameters and which almost always indicates a caller bug.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let name = name.into();
        let value = value.into();
        if value.is_empty_str() {
            return Err(Error::EmptyValue { name });
        }
        Ok(Self {
            name,
            value,
            comment: None,
            source: None,
        })
    }

    /// Create an entry carrying a trailing comment.
    pub fn with_comment(
        name: impl Into<String>,
        value: impl Into<Value>,
        comment: impl Into<String>,
    ) -> Result<Self> {
        let mut entry = Self::new(name, value)?;
        entry.comment = Some(comment.into());
        Ok(entry)
    }

    /// Build an entry from a parsed line, retaining the verbatim source.
    pub(crate) fn from_parsed(
        name: String,
        value: Value,
        comment: Option<String>,
        source: String,
    ) -> Result<Self> {
        let mut entry = Self::new(name, value)?;
        entry.comment = comment;
        entry.source = Some(source);
        Ok(entry)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The verbatim source line, present only for parsed, never-reassigned
    /// entries.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Replace the value, dropping the retained source line so the entry is
    /// re-rendered canonically from now on.
    pub(crate) fn set_value(&mut self, value: Value) -> Result<()> {
        if value.is_empty_str() {
            return Err(Error::EmptyValue {
                name: self.name.clone(),
            });
        }
        self.value = value;
        self.source = None;
        Ok(())
    }

    pub(crate) fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    /// Canonical token for the value alone, without the name.
    pub fn serialize(&self) -> String {
        self.value.to_string()
    }
}

impl fmt::Display for Entry {
    /// Full canonical line: `name = value`, plus `  # comment` if present.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)?;
        if let Some(comment) = &self.comment {
            write!(f, "  # {comment}")?;
        }
        Ok(())
    }
}
