//! Value typing for configuration settings.
//!
//! A raw token from a configuration line is classified into one of six
//! semantic types using surface syntax alone. The lexical classes overlap
//! (`10` is an integer, `10s` a duration, `10kB` a memory size, `10x` a bare
//! string), so classification runs in a fixed priority order and anything
//! that matches nothing falls back to a string.
//!
//! The inverse direction is [`Value`]'s `Display` impl, which renders the
//! canonical token used when a setting was created or changed through the
//! API rather than parsed from a file.

use chrono::TimeDelta;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::{Error, Result};

/// Microseconds per duration unit, coarsest first.
const US_PER_DAY: i64 = 86_400_000_000;
const US_PER_HOUR: i64 = 3_600_000_000;
const US_PER_MINUTE: i64 = 60_000_000;
const US_PER_SECOND: i64 = 1_000_000;
const US_PER_MILLISECOND: i64 = 1_000;

/// A typed configuration value.
///
/// Every variant must be handled explicitly by both classification and
/// rendering, so adding a variant is a compile-time-visible obligation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `on` / `off`, `true` / `false`, `yes` / `no`.
    Bool(bool),
    /// From a decimal, leading-zero octal, or `0x` hex literal.
    Int(i64),
    Float(f64),
    /// Byte count, from a `kB` / `MB` / `GB` / `TB` token.
    Memory(u64),
    /// Signed offset with microsecond resolution, from a `us` / `ms` / `s` /
    /// `min` / `h` / `d` token.
    Duration(TimeDelta),
    /// Arbitrary text; quote characters are ordinary content.
    Str(String),
}

impl Value {
    /// True for a string value equal to the empty string, which no entry may
    /// hold.
    pub(crate) fn is_empty_str(&self) -> bool {
        matches!(self, Value::Str(s) if s.is_empty())
    }
}

/// Classify a raw token into a typed [`Value`].
///
/// The only rejected input is a broken quote: a token that opens a single
/// quote without closing it, or closes one that was never opened.
///
/// ```
/// use pgconf::{Value, parse_value};
///
/// assert_eq!(parse_value("on")?, Value::Bool(true));
/// assert_eq!(parse_value("010")?, Value::Int(8));
/// assert_eq!(parse_value("512MB")?, Value::Memory(512 * 1024 * 1024));
/// assert_eq!(parse_value("124.7MB")?, Value::Str("124.7MB".into()));
/// # Ok::<(), pgconf::Error>(())
/// ```
pub fn parse_value(token: &str) -> Result<Value> {
    let trimmed = token.trim();
    if let Some(rest) = trimmed.strip_prefix('\'') {
        let Some(inner) = rest.strip_suffix('\'') else {
            return Err(Error::MalformedValue {
                token: trimmed.to_string(),
            });
        };
        let unescaped = inner.replace("\\'", "'");
        // Inside quotes the string fallback keeps the text exactly as
        // written, surrounding whitespace included.
        Ok(classify(&unescaped).unwrap_or(Value::Str(unescaped)))
    } else if trimmed.ends_with('\'') {
        Err(Error::MalformedValue {
            token: trimmed.to_string(),
        })
    } else {
        Ok(classify(trimmed).unwrap_or_else(|| Value::Str(trimmed.to_string())))
    }
}

/// Try every non-string class in priority order.
fn classify(token: &str) -> Option<Value> {
    let token = token.trim();
    match token {
        "on" | "true" | "yes" => return Some(Value::Bool(true)),
        "off" | "false" | "no" => return Some(Value::Bool(false)),
        _ => {}
    }
    if let Some(n) = parse_int(token) {
        return Some(Value::Int(n));
    }
    if let Some(x) = parse_float(token) {
        return Some(Value::Float(x));
    }
    if let Some(bytes) = parse_memory(token) {
        return Some(Value::Memory(bytes));
    }
    parse_duration(token).map(Value::Duration)
}

/// Integer with generic-base inference: `0x` prefix is hex, a leading zero
/// over only octal digits is octal (`010` is 8), everything else decimal.
fn parse_int(token: &str) -> Option<i64> {
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if body.is_empty() {
        return None;
    }
    let magnitude = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        i64::from_str_radix(hex, 16).ok()?
    } else if !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    } else if body.len() > 1 && body.starts_with('0') && body.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        i64::from_str_radix(body, 8).ok()?
    } else {
        body.parse().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Optional `-`, digits, `.`, digits. No exponent forms, no bare `.5`.
fn parse_float(token: &str) -> Option<f64> {
    let body = token.strip_prefix('-').unwrap_or(token);
    let (int_part, frac_part) = body.split_once('.')?;
    if int_part.is_empty() || frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Decimal magnitude, at most one space, then an exact case-sensitive memory
/// unit. A fractional magnitude (`124.7MB`) disqualifies the whole rule.
fn parse_memory(token: &str) -> Option<u64> {
    const UNITS: [(&str, u32); 4] = [("kB", 1), ("MB", 2), ("GB", 3), ("TB", 4)];
    for (suffix, exponent) in UNITS {
        if let Some(magnitude) = token.strip_suffix(suffix) {
            let magnitude = magnitude.strip_suffix(' ').unwrap_or(magnitude);
            if magnitude.is_empty() || !magnitude.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let n: u64 = magnitude.parse().ok()?;
            return n.checked_mul(1024u64.pow(exponent));
        }
    }
    None
}

/// Signed decimal magnitude, at most one space, then a duration unit.
/// Multi-character suffixes are tried before `s` so `150ms` is not read as
/// `150m` seconds.
fn parse_duration(token: &str) -> Option<TimeDelta> {
    const UNITS: [(&str, i64); 6] = [
        ("us", 1),
        ("ms", US_PER_MILLISECOND),
        ("min", US_PER_MINUTE),
        ("s", US_PER_SECOND),
        ("h", US_PER_HOUR),
        ("d", US_PER_DAY),
    ];
    for (suffix, us_per_unit) in UNITS {
        if let Some(magnitude) = token.strip_suffix(suffix) {
            let magnitude = magnitude.strip_suffix(' ').unwrap_or(magnitude);
            let body = magnitude.strip_prefix('-').unwrap_or(magnitude);
            if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let n: i64 = magnitude.parse().ok()?;
            return Some(TimeDelta::microseconds(n.checked_mul(us_per_unit)?));
        }
    }
    None
}

impl fmt::Display for Value {
    /// Canonical token rendering, the inverse of [`parse_value`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Int(n) => write!(f, "{n}"),
            // Debug keeps the `.0` on integral floats, so the token stays in
            // the float class when read back.
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Memory(bytes) => {
                const UNITS: [(&str, u64); 4] =
                    [("TB", 1 << 40), ("GB", 1 << 30), ("MB", 1 << 20), ("kB", 1 << 10)];
                for (unit, unit_bytes) in UNITS {
                    if bytes % unit_bytes == 0 {
                        return write!(f, "'{} {}'", bytes / unit_bytes, unit);
                    }
                }
                // Not a whole number of any unit: plain byte count.
                write!(f, "{bytes}")
            }
            Value::Duration(delta) => {
                // Saturates on the (unreachable through parsing) overflow of
                // the microsecond total.
                let us = delta.num_microseconds().unwrap_or(i64::MAX);
                const UNITS: [(&str, i64); 5] = [
                    ("d", US_PER_DAY),
                    ("h", US_PER_HOUR),
                    ("min", US_PER_MINUTE),
                    ("s", US_PER_SECOND),
                    ("ms", US_PER_MILLISECOND),
                ];
                for (unit, us_per_unit) in UNITS {
                    if us % us_per_unit == 0 {
                        let n = us / us_per_unit;
                        // Single-letter units attach directly: '1d', '2 h'
                        // would re-parse but is not what postgres writes.
                        return if unit.len() == 1 {
                            write!(f, "'{n}{unit}'")
                        } else {
                            write!(f, "'{n} {unit}'")
                        };
                    }
                }
                write!(f, "'{us} us'")
            }
            Value::Str(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Memory(bytes) => serializer.serialize_u64(*bytes),
            Value::Duration(delta) => match delta.num_microseconds() {
                Some(us) => serializer.serialize_i64(us),
                None => Err(serde::ser::Error::custom("duration overflows microseconds")),
            },
            Value::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<TimeDelta> for Value {
    fn from(delta: TimeDelta) -> Self {
        Value::Duration(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(token: &str) -> Value {
        parse_value(token).unwrap()
    }

    #[test]
    fn test_parse_booleans() {
        assert_eq!(parsed("on"), Value::Bool(true));
        assert_eq!(parsed("true"), Value::Bool(true));
        assert_eq!(parsed("yes"), Value::Bool(true));
        assert_eq!(parsed("off"), Value::Bool(false));
        assert_eq!(parsed("false"), Value::Bool(false));
        assert_eq!(parsed("'no'"), Value::Bool(false));
    }

    #[test]
    fn test_parse_integers() {
        assert_eq!(parsed("10"), Value::Int(10));
        assert_eq!(parsed("-2"), Value::Int(-2));
        // Leading zero means octal, like the server's own GUC lexer
        assert_eq!(parsed("010"), Value::Int(8));
        assert_eq!(parsed("'010'"), Value::Int(8));
        assert_eq!(parsed("0x10"), Value::Int(16));
        assert_eq!(parsed("0X1f"), Value::Int(31));
        // A leading zero over non-octal digits is read as decimal
        assert_eq!(parsed("090"), Value::Int(90));
    }

    #[test]
    fn test_parse_floats() {
        assert_eq!(parsed("1.4"), Value::Float(1.4));
        assert_eq!(parsed("-0.5"), Value::Float(-0.5));
        assert_eq!(parsed("0.9"), Value::Float(0.9));
    }

    #[test]
    fn test_parse_strings() {
        assert_eq!(parsed("/a/path/to/file.conf"), Value::Str("/a/path/to/file.conf".into()));
        assert_eq!(parsed("0755.log"), Value::Str("0755.log".into()));
        assert_eq!(parsed("file_ending_with_B"), Value::Str("file_ending_with_B".into()));
        assert_eq!(parsed("md5"), Value::Str("md5".into()));
        assert_eq!(parsed(r"'esc\'aped string'"), Value::Str("esc'aped string".into()));
        // Quoted strings keep their inner whitespace
        assert_eq!(parsed(r"'%m [%p] %q%u@%d '"), Value::Str("%m [%p] %q%u@%d ".into()));
        // A fractional magnitude disqualifies unit parsing
        assert_eq!(parsed("124.7MB"), Value::Str("124.7MB".into()));
        assert_eq!(parsed("124.7ms"), Value::Str("124.7ms".into()));
    }

    #[test]
    fn test_parse_memory() {
        assert_eq!(parsed("1kB"), Value::Memory(1024));
        assert_eq!(parsed("512MB"), Value::Memory(512 * 1024 * 1024));
        assert_eq!(parsed(" 64 GB "), Value::Memory(64 * 1024 * 1024 * 1024));
        assert_eq!(parsed("5TB"), Value::Memory(5 * 1024 * 1024 * 1024 * 1024));
    }

    #[test]
    fn test_parse_durations() {
        assert_eq!(parsed("150 ms"), Value::Duration(TimeDelta::milliseconds(150)));
        assert_eq!(parsed("24s "), Value::Duration(TimeDelta::seconds(24)));
        assert_eq!(parsed("' 5 min'"), Value::Duration(TimeDelta::minutes(5)));
        assert_eq!(parsed("2 h"), Value::Duration(TimeDelta::hours(2)));
        assert_eq!(parsed("5d"), Value::Duration(TimeDelta::days(5)));
        assert_eq!(parsed("-30s"), Value::Duration(TimeDelta::seconds(-30)));
    }

    #[test]
    fn test_parse_broken_quotes() {
        assert!(matches!(
            parse_value("'missing last quote"),
            Err(Error::MalformedValue { .. })
        ));
        assert!(matches!(
            parse_value("trailing'"),
            Err(Error::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Int(0).to_string(), "0");
        assert_eq!(Value::Int(15).to_string(), "15");
        assert_eq!(Value::Int(-2).to_string(), "-2");
        assert_eq!(Value::Float(0.1).to_string(), "0.1");
        // An integral float keeps its fractional part
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(-2.0).to_string(), "-2.0");
    }

    #[test]
    fn test_render_strings_always_quoted() {
        assert_eq!(Value::Str("enum".into()).to_string(), "'enum'");
        assert_eq!(Value::Str("*".into()).to_string(), "'*'");
        assert_eq!(Value::Str("sp ced".into()).to_string(), "'sp ced'");
        assert_eq!(Value::Str("quo'ed".into()).to_string(), r"'quo\'ed'");
        // Pre-existing quotes are content and get escaped, not stripped
        assert_eq!(Value::Str("'quoted'".into()).to_string(), r"'\'quoted\''");
    }

    #[test]
    fn test_render_memory() {
        assert_eq!(Value::Memory(2048).to_string(), "'2 kB'");
        assert_eq!(Value::Memory(3 * 1024 * 1024).to_string(), "'3 MB'");
        assert_eq!(Value::Memory(1 << 40).to_string(), "'1 TB'");
        // Not unit-aligned: raw byte count
        assert_eq!(Value::Memory(1000).to_string(), "1000");
        // Zero divides every unit, so the coarsest wins
        assert_eq!(Value::Memory(0).to_string(), "'0 TB'");
    }

    #[test]
    fn test_render_durations_pick_coarsest_unit() {
        assert_eq!(Value::Duration(TimeDelta::days(1)).to_string(), "'1d'");
        assert_eq!(Value::Duration(TimeDelta::minutes(60)).to_string(), "'1h'");
        assert_eq!(Value::Duration(TimeDelta::minutes(61)).to_string(), "'61 min'");
        assert_eq!(Value::Duration(TimeDelta::seconds(24)).to_string(), "'24s'");
        assert_eq!(Value::Duration(TimeDelta::microseconds(12_000)).to_string(), "'12 ms'");
        assert_eq!(Value::Duration(TimeDelta::microseconds(5)).to_string(), "'5 us'");
    }

    #[test]
    fn test_semantic_round_trip() {
        let tokens = [
            "on", "off", "10", "010", "0x10", "-2", "1.0", "1.4", "1kB", "512MB", "5TB",
            "0kB", "150 ms", "24s", "' 5 min'", "2 h", "5d", "md5", "'*'", "/a/path",
            "124.7MB", r"'esc\'aped string'",
        ];
        for token in tokens {
            let value = parsed(token);
            let rendered = value.to_string();
            assert_eq!(parsed(&rendered), value, "round-trip of {token:?} via {rendered:?}");
        }
    }

    #[test]
    fn test_serde_representation() {
        assert_eq!(serde_json::to_value(Value::Bool(true)).unwrap(), serde_json::json!(true));
        assert_eq!(serde_json::to_value(Value::Int(-2)).unwrap(), serde_json::json!(-2));
        assert_eq!(serde_json::to_value(Value::Memory(1024)).unwrap(), serde_json::json!(1024));
        // Durations export as their microsecond total
        assert_eq!(
            serde_json::to_value(Value::Duration(TimeDelta::seconds(1))).unwrap(),
            serde_json::json!(1_000_000)
        );
        assert_eq!(
            serde_json::to_value(Value::Str("md5".into())).unwrap(),
            serde_json::json!("md5")
        );
    }
}
