//! The ordered configuration document.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Write;
use std::ops::Index;
use std::path::Path;
use tracing::debug;

use crate::entry::Entry;
use crate::include::IncludeResolver;
use crate::parser;
use crate::value::{self, Value};
use crate::{Error, Result};

/// An ordered PostgreSQL configuration document.
///
/// Entries keep document order and names are unique: a setting that appears
/// twice keeps its first position but carries the later value, matching how
/// the server itself applies duplicates. Entries parsed from a file and
/// never reassigned save back byte-identical; everything else is rendered
/// canonically.
#[derive(Debug, Default)]
pub struct Configuration {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
}

impl Configuration {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration file, expanding `include`, `include_dir`, and
    /// `include_if_exists` directives relative to it.
    pub fn parse_path(path: impl AsRef<Path>) -> Result<Self> {
        let lines = IncludeResolver::expand(path.as_ref())?;
        Self::assemble(lines)
    }

    /// Parse from in-memory lines.
    ///
    /// Include directives are rejected here because there is no base file to
    /// resolve them against; use [`Configuration::parse_path`] for those.
    pub fn parse_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::assemble(
            lines
                .into_iter()
                .map(|line| line.as_ref().trim_end_matches(['\r', '\n']).to_string())
                .collect(),
        )
    }

    fn assemble(lines: Vec<String>) -> Result<Self> {
        let mut conf = Self::new();
        for line in lines {
            let Some(raw) = parser::parse_line(&line)? else {
                continue;
            };
            // When parsing started from a file the resolver has already
            // consumed every directive, so one surfacing here means there
            // was no base path to expand it against.
            if parser::is_include_directive(&raw.name) {
                return Err(Error::MissingIncludeContext);
            }
            let parsed = value::parse_value(&raw.value)?;
            match conf.by_name.get(&raw.name) {
                Some(&idx) => {
                    // A later duplicate wins; the entry keeps its position
                    // but is re-rendered canonically from now on.
                    debug!(name = %raw.name, "duplicate setting overrides earlier value");
                    let entry = &mut conf.entries[idx];
                    entry.set_value(parsed)?;
                    entry.set_comment(raw.comment);
                }
                None => {
                    let entry = Entry::from_parsed(raw.name.clone(), parsed, raw.comment, line)?;
                    conf.by_name.insert(raw.name, conf.entries.len());
                    conf.entries.push(entry);
                }
            }
        }
        debug!(entries = conf.len(), "assembled configuration");
        Ok(conf)
    }

    /// Current value of a setting.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.by_name
            .get(name)
            .map(|&idx| self.entries[idx].value())
            .ok_or_else(|| Error::UnknownParameter {
                name: name.to_string(),
            })
    }

    /// The full entry for a setting, if present.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.by_name.get(name).map(|&idx| &self.entries[idx])
    }

    /// Create or update a setting.
    ///
    /// A new setting is appended at the end of the document; an existing one
    /// keeps its position and comment but loses its verbatim source line, so
    /// the next save renders it canonically.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self.by_name.get(name) {
            Some(&idx) => self.entries[idx].set_value(value.into()),
            None => {
                let entry = Entry::new(name, value)?;
                self.by_name.insert(name.to_string(), self.entries.len());
                self.entries.push(entry);
                Ok(())
            }
        }
    }

    /// Membership test by setting name.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Snapshot of the document as a name -> current value map.
    pub fn as_map(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .map(|entry| (entry.name().to_string(), entry.value().clone()))
            .collect()
    }

    /// Render the document into a writer, one linear pass in stored order.
    ///
    /// Saving twice without reassigning anything in between produces the
    /// same bytes.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        write!(writer, "{self}")?;
        Ok(())
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match entry.source() {
                Some(line) => writeln!(f, "{line}")?,
                None => writeln!(f, "{entry}")?,
            }
        }
        Ok(())
    }
}

impl Index<&str> for Configuration {
    type Output = Value;

    /// Mapping-style access.
    ///
    /// # Panics
    ///
    /// Panics if the setting is absent; use [`Configuration::get`] for a
    /// fallible lookup.
    fn index(&self, name: &str) -> &Value {
        match self.by_name.get(name) {
            Some(&idx) => self.entries[idx].value(),
            None => panic!("no entry for parameter '{name}'"),
        }
    }
}

impl<'a> IntoIterator for &'a Configuration {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
