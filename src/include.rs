//! Expansion of `include` directives into a flat line stream.
//!
//! `postgresql.conf` files can pull in other files with `include`,
//! `include_dir`, and `include_if_exists`. Expansion replaces each directive
//! line with the lines of its target, depth-first, so the flattened stream
//! reads exactly as the server would read it.
//!
//! The walk is an explicit iteration over a frame stack rather than native
//! recursion: the set of canonical paths currently on the stack doubles as
//! the cycle detector, and stack depth is bounded by the frame vector.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::parser;
use crate::value::{self, Value};
use crate::{Error, Result};

/// Suffix a file must carry to be picked up by `include_dir`.
const CONF_SUFFIX: &str = ".conf";

/// A recognized directive line, with its raw target.
enum Directive {
    Include(String),
    IncludeDir(String),
    IncludeIfExists(String),
}

/// One file mid-expansion: its remaining lines plus the identity used for
/// cycle detection. Synthetic frames (the file list of an `include_dir`)
/// carry no identity of their own.
struct Frame {
    path: PathBuf,
    canonical: Option<PathBuf>,
    lines: std::vec::IntoIter<String>,
}

/// Depth-first include expansion, scoped to one top-level parse call.
pub(crate) struct IncludeResolver {
    stack: Vec<Frame>,
    active: HashSet<PathBuf>,
}

impl IncludeResolver {
    /// Flatten `path` and everything it includes into one ordered line
    /// stream. Lines are returned without their trailing newline.
    pub(crate) fn expand(path: &Path) -> Result<Vec<String>> {
        let mut resolver = Self {
            stack: Vec::new(),
            active: HashSet::new(),
        };
        resolver.push_file(path)?;

        let mut flat = Vec::new();
        loop {
            let Some(frame) = resolver.stack.last_mut() else {
                break;
            };
            let Some(line) = frame.lines.next() else {
                // Frame exhausted: its file is no longer part of any cycle.
                if let Some(frame) = resolver.stack.pop() {
                    if let Some(canonical) = frame.canonical {
                        resolver.active.remove(&canonical);
                    }
                }
                continue;
            };
            let including = frame.path.clone();
            match directive_of(&line)? {
                Some(directive) => resolver.enter(directive, &including)?,
                None => flat.push(line),
            }
        }
        Ok(flat)
    }

    /// Substitute one directive by pushing its target(s) onto the stack.
    fn enter(&mut self, directive: Directive, including: &Path) -> Result<()> {
        let base = including.parent().unwrap_or(Path::new("."));
        match directive {
            Directive::Include(target) => {
                let path = resolve(base, &target);
                if !path.is_file() {
                    return Err(Error::IncludeNotFound {
                        kind: "file",
                        target: path,
                        including: including.to_path_buf(),
                    });
                }
                self.push_file(&path)
            }
            Directive::IncludeIfExists(target) => {
                let path = resolve(base, &target);
                if path.is_file() {
                    self.push_file(&path)
                } else {
                    debug!(missing = %path.display(), "include_if_exists target missing, skipping");
                    Ok(())
                }
            }
            Directive::IncludeDir(target) => {
                let dir = resolve(base, &target);
                if !dir.is_dir() {
                    return Err(Error::IncludeNotFound {
                        kind: "directory",
                        target: dir,
                        including: including.to_path_buf(),
                    });
                }
                let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
                    .collect::<std::io::Result<Vec<_>>>()?
                    .into_iter()
                    .map(|dirent| dirent.path())
                    .filter(|path| {
                        path.is_file()
                            && path
                                .file_name()
                                .and_then(|name| name.to_str())
                                .is_some_and(|name| name.ends_with(CONF_SUFFIX))
                    })
                    .collect();
                files.sort();
                debug!(dir = %dir.display(), files = files.len(), "expanding include_dir");
                // A synthetic frame of `include` lines keeps expansion
                // strictly one file at a time: each target only becomes
                // cycle-active once its own expansion starts.
                let lines = files
                    .iter()
                    .map(|file| format!("include '{}'", file.display().to_string().replace('\'', "\\'")))
                    .collect::<Vec<_>>();
                self.stack.push(Frame {
                    path: including.to_path_buf(),
                    canonical: None,
                    lines: lines.into_iter(),
                });
                Ok(())
            }
        }
    }

    /// Read a file and push it as the new top frame, marking it
    /// cycle-active. The handle is released before the frame is processed.
    fn push_file(&mut self, path: &Path) -> Result<()> {
        let canonical = fs::canonicalize(path)?;
        if self.active.contains(&canonical) {
            return Err(Error::IncludeLoop {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        debug!(file = %path.display(), lines = lines.len(), "expanding configuration file");
        self.active.insert(canonical.clone());
        self.stack.push(Frame {
            path: path.to_path_buf(),
            canonical: Some(canonical),
            lines: lines.into_iter(),
        });
        Ok(())
    }
}

/// Recognize an include directive, returning its target path text.
fn directive_of(line: &str) -> Result<Option<Directive>> {
    let Some(raw) = parser::parse_line(line)? else {
        return Ok(None);
    };
    if !parser::is_include_directive(&raw.name) {
        return Ok(None);
    }
    // Targets are usually quoted; anything that classifies as a non-string
    // (a file literally named `010`, say) keeps its raw spelling.
    let target = match value::parse_value(&raw.value)? {
        Value::Str(s) => s,
        _ => raw.value,
    };
    Ok(Some(match raw.name.as_str() {
        "include" => Directive::Include(target),
        "include_dir" => Directive::IncludeDir(target),
        _ => Directive::IncludeIfExists(target),
    }))
}

/// Resolve `target` against the including file's directory when relative.
fn resolve(base: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        base.join(target)
    }
}
