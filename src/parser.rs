//! Line tokenizer for `name [=] value [# comment]` lines.
//!
//! This stage only splits a line into its three parts; value classification
//! lives in [`crate::value`] and include directives are consumed earlier by
//! [`crate::include`].

use crate::{Error, Result};

/// A tokenized setting line, before value classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub name: String,
    /// The raw value token, still quoted if it was quoted in the source.
    pub value: String,
    pub comment: Option<String>,
}

/// Reserved names consumed by include expansion, never stored as settings.
pub(crate) fn is_include_directive(name: &str) -> bool {
    matches!(name, "include" | "include_dir" | "include_if_exists")
}

/// Tokenize one logical line.
///
/// Returns `Ok(None)` for blank lines and for lines whose first non-space
/// character is `#` (pure comments, including the indented continuation
/// comments postgres sample files hang under a setting).
pub fn parse_line(line: &str) -> Result<Option<RawLine>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let name_end = trimmed
        .bytes()
        .position(|b| !(b.is_ascii_alphanumeric() || b == b'.' || b == b'_'))
        .unwrap_or(trimmed.len());
    let name = &trimmed[..name_end];
    let rest = &trimmed[name_end..];

    // A lone word with nothing after it, or a line not starting with a name
    // token, cannot carry a value.
    if name.is_empty()
        || rest.is_empty()
        || !(rest.starts_with('=') || rest.starts_with(char::is_whitespace))
    {
        return Err(Error::MalformedLine {
            line: trimmed.to_string(),
        });
    }

    let mut rest = rest.trim_start();
    if let Some(after_eq) = rest.strip_prefix('=') {
        rest = after_eq.trim_start();
    }

    let (value, comment) = split_comment(rest);
    Ok(Some(RawLine {
        name: name.to_string(),
        value: value.to_string(),
        comment: comment.map(str::to_string),
    }))
}

/// Split at the first `#` outside a single-quoted region. `\'` does not
/// close a quote.
fn split_comment(s: &str) -> (&str, Option<&str>) {
    let mut in_quote = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quote => escaped = true,
            '\'' => in_quote = !in_quote,
            '#' if !in_quote => {
                let comment = s[i + 1..].trim();
                return (s[..i].trim_end(), (!comment.is_empty()).then_some(comment));
            }
            _ => {}
        }
    }
    (s.trim_end(), None)
}
