//! Concrete regular-expression values and regex-literal compaction.
//!
//! The query language accepts a regex either as a literal (`/x/i`) or as an
//! operator document (`{"$regex": "x", "$options": "i"}`). Fragments produced
//! here always use the literal form: whenever a document holds nothing but
//! `$regex` and `$options`, it is collapsed into one [`RegexLit`].

use std::fmt;

use regex::RegexBuilder;

use crate::error::{Result, SiftError};
use crate::op::Op;
use crate::value::{Document, Value};

/// Option letters understood by the query language.
const FLAGS: &str = "imsx";

/// A regular expression: pattern source plus a normalized option set.
///
/// Options are deduplicated and sorted, so `RegexLit::new("a", "mi")` and
/// `RegexLit::new("a", "im")` are equal.
///
/// ```
/// use sift::RegexLit;
///
/// let regex = RegexLit::new("^ab", "xi").unwrap();
/// assert_eq!(regex.flags(), "ix");
/// assert_eq!(regex.to_string(), "/^ab/ix");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegexLit {
    pattern: String,
    flags: String,
}

impl RegexLit {
    /// Creates a regex, validating both the options and the pattern.
    pub fn new(pattern: impl Into<String>, flags: &str) -> Result<Self> {
        let regex = RegexLit {
            pattern: pattern.into(),
            flags: normalize_flags(flags)?,
        };
        regex.compile()?;
        Ok(regex)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Returns a copy whose options are the union of these and `extra`.
    pub fn with_flags(&self, extra: &str) -> Result<Self> {
        let mut combined = self.flags.clone();
        combined.push_str(extra);
        Ok(RegexLit {
            pattern: self.pattern.clone(),
            flags: normalize_flags(&combined)?,
        })
    }

    /// Compiles the pattern with the `regex` crate.
    pub fn compile(&self) -> Result<regex::Regex> {
        let regex = RegexBuilder::new(&self.pattern)
            .case_insensitive(self.has_flag('i'))
            .multi_line(self.has_flag('m'))
            .dot_matches_new_line(self.has_flag('s'))
            .ignore_whitespace(self.has_flag('x'))
            .build()?;
        Ok(regex)
    }

    /// Tests the regex against `text`.
    pub fn is_match(&self, text: &str) -> Result<bool> {
        Ok(self.compile()?.is_match(text))
    }

    fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }
}

impl fmt::Display for RegexLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.flags)
    }
}

fn normalize_flags(flags: &str) -> Result<String> {
    let mut letters: Vec<char> = Vec::with_capacity(flags.len());
    for flag in flags.chars() {
        if !FLAGS.contains(flag) {
            return Err(SiftError::InvalidRegexFlag(flag));
        }
        if !letters.contains(&flag) {
            letters.push(flag);
        }
    }
    letters.sort_unstable();
    Ok(letters.into_iter().collect())
}

/// Returns `true` if `doc` holds `$regex` and at most `$options` besides.
pub(crate) fn is_regex_spec(doc: &Document) -> bool {
    let regex = Op::Regex.as_str();
    let options = Op::Options.as_str();
    doc.contains_key(regex) && doc.keys().all(|key| key == regex || key == options)
}

/// Collapses a `{$regex, $options}` document into a concrete regex.
///
/// Returns `Ok(None)` when the document has any other key.
pub(crate) fn compact(field: &str, doc: &Document) -> Result<Option<RegexLit>> {
    if !is_regex_spec(doc) {
        return Ok(None);
    }
    let options = match doc.get(Op::Options.as_str()) {
        None => "",
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(SiftError::validation(
                field,
                other,
                "regex options must be a string",
            ))
        }
    };
    match doc.get(Op::Regex.as_str()) {
        Some(pattern) => from_pattern(field, pattern, options).map(Some),
        None => Ok(None),
    }
}

/// Builds a regex from a string, number or regex pattern.
///
/// Numeric patterns are stringified. When the pattern already is a regex,
/// its options and `options` are unioned.
pub(crate) fn from_pattern(field: &str, pattern: &Value, options: &str) -> Result<RegexLit> {
    let built = match pattern {
        Value::Regex(regex) => regex.with_flags(options),
        Value::String(s) => RegexLit::new(s.as_str(), options),
        Value::Number(n) if !n.is_nan() => RegexLit::new(n.to_string(), options),
        other => {
            return Err(SiftError::validation(
                field,
                other,
                "pattern must be a string, number or regex",
            ))
        }
    };
    built.map_err(|err| SiftError::validation(field, pattern, err.to_string()))
}
