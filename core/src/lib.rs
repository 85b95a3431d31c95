//! itemmatch - criteria matching over items with nested auxiliary data
//!
//! Decides whether an item (identifier, display name, custom model data and
//! an arbitrarily nested data blob) satisfies a user-authored criteria
//! mapping.
//!
//! # Architecture
//!
//! - [`DataValue`]: Erased nested data (maps keep source order)
//! - [`flatten`]: Nested data → ordered `path → value` index ([`FlatRecord`])
//! - [`Glob`]: The wildcard contract every criterion matches with
//! - [`Criteria`]: Compiled, closed set of criteria (parse-time typing)
//! - [`ItemView`]: Host seam: how the matcher reads an item
//! - [`RuleSet`]: Named criteria, first matching rule wins
//!
//! # Key Design Insights
//!
//! 1. **Counting, not boolean composition**: every present criterion raises
//!    the required count; the item matches iff `passed >= required`. Empty
//!    criteria match everything.
//!
//! 2. **Types settle at compile time**: the loosely-typed mapping is compiled
//!    once into tagged variants. A malformed criterion is either a hard error
//!    ([`Strictness::Strict`]) or dropped with a diagnostic
//!    ([`Strictness::Lenient`]); it never fails an evaluation.
//!
//! 3. **Evaluation is pure**: [`Criteria::evaluate`] returns a
//!    [`MatchOutcome`]; nothing is stored between calls, so one `Criteria` may
//!    be shared across threads and items.
//!
//! # Example
//!
//! ```
//! use itemmatch::prelude::*;
//!
//! let criteria = Criteria::builder()
//!     .material("diamond_*")
//!     .nbt_value("tag.level=5")
//!     .build()
//!     .unwrap();
//!
//! let item = Item::new("DIAMOND_SWORD").with_raw_data(DataValue::map([(
//!     "tag",
//!     DataValue::map([("level", 5_i64)]),
//! )]));
//!
//! let outcome = criteria.evaluate(&item);
//! assert_eq!((outcome.required, outcome.passed), (2, 2));
//! assert!(criteria.is_matching(&item));
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod criteria;
mod data_value;
mod flatten;
mod glob;
mod item;
mod matcher;
mod rule_set;
mod trace;

#[cfg(feature = "config")]
pub mod config;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use criteria::{Criteria, CriteriaBuilder, EntryPattern, NbtValue, Strictness};
pub use data_value::DataValue;
pub use flatten::{flatten, FlatRecord};
pub use glob::Glob;
pub use item::{Item, ItemView, PlainText, TextComponent};
pub use matcher::MatchOutcome;
pub use rule_set::{RuleSet, RuleSetError};
pub use trace::{CriterionTrace, MatchTrace};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use itemmatch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Criteria, CriteriaError, CriterionTrace, DataValue, FlatRecord, Glob, Item, ItemView,
        MatchOutcome, MatchTrace, PlainText, RuleSet, RuleSetError, Strictness, TextComponent,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Lower-case path suffix that marks the fallback blob.
pub const FALLBACK_SUFFIX: &str = "internal";

/// Maximum length for a single glob pattern, in bytes.
///
/// Globs compile to regexes built only from escaped literals and `.*`, so
/// they are held to the literal-pattern limit. No user-written regex syntax
/// reaches the regex compiler.
pub const MAX_PATTERN_LENGTH: usize = 8192;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from compiling a criteria mapping.
///
/// These surface at compile time only. In lenient mode they are collected in
/// [`Criteria::diagnostics`] and the offending criterion is dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    /// The criteria source is not a mapping.
    #[error("criteria must be a mapping, found {found}")]
    NotAMapping {
        /// Kind of value found instead.
        found: &'static str,
    },

    /// A criterion's value has the wrong type.
    #[error("criterion \"{criterion}\" expects {expected}, found {found}")]
    WrongType {
        /// The configuration key.
        criterion: &'static str,
        /// What the criterion accepts.
        expected: &'static str,
        /// Kind of value found instead.
        found: &'static str,
    },

    /// A list-valued criterion was given an empty list.
    #[error("criterion \"{criterion}\" is an empty list; remove it or add entries")]
    EmptyList {
        /// The configuration key.
        criterion: &'static str,
    },

    /// A glob pattern exceeds [`MAX_PATTERN_LENGTH`].
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length of the pattern.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// A glob pattern could not be compiled.
    #[error("invalid pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying error message.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CriteriaError::WrongType {
            criterion: "custom-model-data",
            expected: "integer",
            found: "string",
        };
        assert_eq!(
            err.to_string(),
            "criterion \"custom-model-data\" expects integer, found string"
        );

        let err = CriteriaError::NotAMapping { found: "list" };
        assert_eq!(err.to_string(), "criteria must be a mapping, found list");
    }

    #[test]
    fn test_public_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Criteria>();
        assert_send_sync::<RuleSet>();
        assert_send_sync::<FlatRecord>();
        assert_send_sync::<CriteriaError>();
    }
}
