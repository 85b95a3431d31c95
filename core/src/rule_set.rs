//! Rule sets: named criteria, first matching rule wins
//!
//! A rule set routes an item to a name:
//!
//! ```yaml
//! rules:
//!   legendary:
//!     material: diamond_*
//!     nbt-value: tag.level=5
//!   any-sword:
//!     material: "*_sword"
//! ```
//!
//! Rules are tried in file order; each is decided by the counting rule of its
//! own criteria. An empty rule matches every item, so it acts as a catch-all
//! when placed last.

use crate::{Criteria, CriteriaError, DataValue, ItemView, Strictness};
use tracing::debug;

const RULES: &str = "rules";

/// Errors from compiling a rule set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleSetError {
    /// The document or its `rules` value is not a mapping.
    #[error("{what} must be a mapping, found {found}")]
    NotAMapping {
        /// Which part of the document.
        what: &'static str,
        /// Kind of value found instead.
        found: &'static str,
    },

    /// One rule's criteria failed to compile.
    #[error("rule \"{name}\": {source}")]
    Rule {
        /// The rule name.
        name: String,
        /// The underlying compile error.
        source: CriteriaError,
    },
}

/// Ordered, named [`Criteria`].
///
/// # Example
///
/// ```
/// use itemmatch::{Criteria, Item, RuleSet};
///
/// let rules = RuleSet::new()
///     .with_rule("swords", Criteria::builder().material("*_sword").build().unwrap())
///     .with_rule("rest", Criteria::empty());
///
/// assert_eq!(rules.first_match(&Item::new("IRON_SWORD")), Some("swords"));
/// assert_eq!(rules.first_match(&Item::new("STONE")), Some("rest"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<(String, Criteria)>,
}

impl RuleSet {
    /// An empty rule set. Matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule (builder pattern).
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>, criteria: Criteria) -> Self {
        self.rules.push((name.into(), criteria));
        self
    }

    /// Compile a `{ rules: { <name>: <criteria> } }` document.
    ///
    /// A missing or null `rules` value yields an empty set. Each rule is
    /// compiled with `strictness`; in lenient mode its diagnostics stay on
    /// that rule's [`Criteria`].
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] if the document shape is wrong, or if a rule
    /// fails to compile.
    pub fn from_value(source: &DataValue, strictness: Strictness) -> Result<Self, RuleSetError> {
        let root = match source {
            DataValue::Map(_) => source,
            DataValue::Null => return Ok(Self::new()),
            other => {
                return Err(RuleSetError::NotAMapping {
                    what: "rule set",
                    found: other.type_name(),
                })
            }
        };

        let rules = match root.get(RULES) {
            None | Some(DataValue::Null) => return Ok(Self::new()),
            Some(DataValue::Map(rules)) => rules,
            Some(other) => {
                return Err(RuleSetError::NotAMapping {
                    what: "\"rules\"",
                    found: other.type_name(),
                })
            }
        };

        let rules = rules
            .iter()
            .map(|(name, value)| {
                Criteria::from_value(value, strictness)
                    .map(|criteria| (name.clone(), criteria))
                    .map_err(|source| RuleSetError::Rule {
                        name: name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rules = rules.len(), "compiled rule set");
        Ok(Self { rules })
    }

    /// Name of the first rule the item matches.
    #[must_use]
    pub fn first_match<I: ItemView + ?Sized>(&self, item: &I) -> Option<&str> {
        self.rules
            .iter()
            .find(|(_, criteria)| criteria.is_matching(item))
            .map(|(name, _)| name.as_str())
    }

    /// Look up a rule by name (first occurrence).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Criteria> {
        self.rules
            .iter()
            .find_map(|(n, criteria)| (n == name).then_some(criteria))
    }

    /// Iterate `(name, criteria)` in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criteria)> {
        self.rules.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
