//! `Glob`: Wildcard patterns used by every criterion
//!
//! The entry-search fallback builds new patterns out of fragments of user
//! patterns (`*<value>*`), so the matching rules are fixed here rather than
//! delegated:
//!
//! - `*` matches zero or more characters of any kind, newlines included
//! - every other character is literal (no escaping, no `?`, no classes)
//! - the pattern covers the whole candidate (anchored at both ends)
//! - comparison is case-insensitive (Unicode simple case folding)
//!
//! Patterns compile to a linear-time regex once, at criteria compile time.

use crate::{CriteriaError, MAX_PATTERN_LENGTH};
use regex::Regex;
use std::fmt;

/// A compiled wildcard pattern.
///
/// # Example
///
/// ```
/// use itemmatch::Glob;
///
/// let glob = Glob::new("diamond_*").unwrap();
/// assert!(glob.matches("DIAMOND_SWORD"));
/// assert!(!glob.matches("golden_sword"));
///
/// // Without `*` the pattern is an equality test.
/// let glob = Glob::new("stone").unwrap();
/// assert!(glob.matches("Stone"));
/// assert!(!glob.matches("cobblestone"));
/// ```
#[derive(Clone)]
pub struct Glob {
    pattern: String,
    kind: GlobKind,
}

#[derive(Clone)]
enum GlobKind {
    /// The pattern is only wildcards: matches every candidate.
    Any,
    Regex(Regex),
}

impl Glob {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::PatternTooLong`] if the pattern exceeds
    /// [`MAX_PATTERN_LENGTH`], or [`CriteriaError::InvalidPattern`] if the
    /// generated regex exceeds the regex size limit.
    pub fn new(pattern: impl Into<String>) -> Result<Self, CriteriaError> {
        let pattern = pattern.into();
        check_length(&pattern)?;
        Self::compile(pattern)
    }

    /// Compile `*<pattern>*`: matches any candidate containing `pattern`.
    ///
    /// The length limit applies to `pattern` as written, not to the wrapped
    /// form.
    ///
    /// # Errors
    ///
    /// Same as [`Glob::new`].
    pub fn wrapped(pattern: &str) -> Result<Self, CriteriaError> {
        check_length(pattern)?;
        Self::compile(format!("*{pattern}*"))
    }

    fn compile(pattern: String) -> Result<Self, CriteriaError> {
        if !pattern.is_empty() && pattern.chars().all(|c| c == '*') {
            return Ok(Self {
                pattern,
                kind: GlobKind::Any,
            });
        }

        let regex = Regex::new(&to_regex(&pattern)).map_err(|e| CriteriaError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern,
            kind: GlobKind::Regex(regex),
        })
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Check a candidate against this pattern.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        match &self.kind {
            GlobKind::Any => true,
            GlobKind::Regex(re) => re.is_match(candidate),
        }
    }
}

fn check_length(pattern: &str) -> Result<(), CriteriaError> {
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(CriteriaError::PatternTooLong {
            len: pattern.len(),
            max: MAX_PATTERN_LENGTH,
        });
    }
    Ok(())
}

/// Translate a glob into an anchored, case-insensitive regex.
fn to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?is)^");
    let mut in_wildcard = false;
    for segment in pattern.split('*') {
        if in_wildcard {
            // Collapse runs of `*` into a single `.*`.
            if !out.ends_with(".*") {
                out.push_str(".*");
            }
        }
        out.push_str(&regex::escape(segment));
        in_wildcard = true;
    }
    out.push('$');
    out
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for Glob {}

impl fmt::Debug for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Glob").field(&self.pattern).finish()
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}
