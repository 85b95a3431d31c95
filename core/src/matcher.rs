//! Evaluation: counting criteria against an item
//!
//! Every present criterion raises `required`; each one that holds raises
//! `passed`. The item matches iff `passed >= required`, so empty criteria
//! match everything.
//!
//! Criteria run in a fixed order (identifier, display name, custom model
//! data, nested-data value, nested-data tags) and every one runs even after
//! a failure, which keeps counts and traces complete. The item's nested data
//! is flattened at most once per evaluation, and only if a nested-data
//! criterion is present.

use crate::criteria::{self, NbtValue};
use crate::{flatten, Criteria, FlatRecord, ItemView};
use std::fmt;
use tracing::debug;

/// The result of one evaluation: how many criteria applied, how many held.
///
/// Returned by value; nothing is stored on [`Criteria`] between calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MatchOutcome {
    /// Number of criteria present.
    pub required: usize,
    /// Number of present criteria that held.
    pub passed: usize,
}

impl MatchOutcome {
    /// The acceptance rule: `passed >= required`.
    #[inline]
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.passed >= self.required
    }

    fn record(&mut self, passed: bool) {
        self.required += 1;
        if passed {
            self.passed += 1;
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} criteria passed", self.passed, self.required)
    }
}

/// What a criterion looked at on the item.
pub(crate) enum Observed<'a> {
    Text(Option<&'a str>),
    Number(Option<i32>),
    Record(&'a FlatRecord),
}

/// One evaluated criterion, handed to the observer in [`Criteria::walk`].
pub(crate) struct Step<'a> {
    pub(crate) criterion: &'static str,
    pub(crate) expected: &'a dyn fmt::Display,
    pub(crate) observed: Observed<'a>,
    pub(crate) passed: bool,
}

impl Criteria {
    /// Evaluate the item and return the counts.
    ///
    /// Never fails: a field the item cannot provide makes its criterion fail.
    ///
    /// ```
    /// use itemmatch::{Criteria, Item};
    ///
    /// let criteria = Criteria::builder().material("stone").name("Rock").build().unwrap();
    /// let outcome = criteria.evaluate(&Item::new("STONE"));
    /// assert_eq!((outcome.required, outcome.passed), (2, 1));
    /// assert!(!outcome.is_match());
    /// ```
    #[must_use]
    pub fn evaluate<I: ItemView + ?Sized>(&self, item: &I) -> MatchOutcome {
        self.walk(item, |_| {})
    }

    /// Does the item satisfy these criteria?
    #[inline]
    #[must_use]
    pub fn is_matching<I: ItemView + ?Sized>(&self, item: &I) -> bool {
        self.evaluate(item).is_match()
    }

    /// Run every present criterion, reporting each to `observe`.
    pub(crate) fn walk<I, F>(&self, item: &I, observe: F) -> MatchOutcome
    where
        I: ItemView + ?Sized,
        F: FnMut(Step<'_>),
    {
        let mut tally = Tally {
            outcome: MatchOutcome::default(),
            observe,
        };

        if let Some(glob) = &self.identifier {
            let identifier = item.identifier();
            let actual = identifier.as_deref();
            tally.emit(Step {
                criterion: criteria::MATERIAL,
                expected: glob,
                observed: Observed::Text(actual),
                passed: actual.is_some_and(|id| glob.matches(id)),
            });
        }

        if let Some(glob) = &self.name {
            let name = item.display_name();
            let actual = name.as_deref();
            tally.emit(Step {
                criterion: criteria::NAME,
                expected: glob,
                observed: Observed::Text(actual),
                passed: actual.is_some_and(|n| glob.matches(n)),
            });
        }

        if let Some(expected) = &self.custom_model_data {
            // Truncation toward zero, saturating at the i32 range.
            let actual = item
                .numeric_tag()
                .and_then(|floats| floats.first())
                .map(|&first| first as i32);
            tally.emit(Step {
                criterion: criteria::CUSTOM_MODEL_DATA,
                expected,
                observed: Observed::Number(actual),
                passed: actual == Some(*expected),
            });
        }

        if !self.needs_record() {
            return tally.outcome;
        }
        let record = item.raw_data().map(flatten).unwrap_or_default();

        if let Some(nbt_value) = &self.nbt_value {
            let passed = match nbt_value {
                NbtValue::Value(glob) => record.any_value_matches(glob),
                NbtValue::Entries(entries) => entries.iter().all(|e| record.contains_entry(e)),
            };
            tally.emit(Step {
                criterion: criteria::NBT_VALUE,
                expected: nbt_value,
                observed: Observed::Record(&record),
                passed,
            });
        }

        #[cfg(feature = "nbt-tags")]
        if let Some(tags) = &self.nbt_tags {
            tally.emit(Step {
                criterion: criteria::NBT_TAGS,
                expected: &TagList(tags),
                observed: Observed::Record(&record),
                passed: tags.iter().all(|tag| record.has_tag(tag)),
            });
        }

        tally.outcome
    }
}

struct Tally<F> {
    outcome: MatchOutcome,
    observe: F,
}

impl<F: FnMut(Step<'_>)> Tally<F> {
    fn emit(&mut self, step: Step<'_>) {
        debug!(
            criterion = step.criterion,
            expected = %step.expected,
            passed = step.passed,
            "criterion evaluated"
        );
        self.outcome.record(step.passed);
        (self.observe)(step);
    }
}

#[cfg(feature = "nbt-tags")]
struct TagList<'a>(&'a [String]);

#[cfg(feature = "nbt-tags")]
impl fmt::Display for TagList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataValue, Item, Strictness};

    fn criteria(source: &str) -> Criteria {
        let value: DataValue = serde_yaml::from_str(source).unwrap();
        Criteria::from_value(&value, Strictness::Strict).unwrap()
    }

    fn sword() -> Item {
        Item::new("DIAMOND_SWORD")
            .with_display_name("Excalibur")
            .with_numeric_tag(vec![7.9])
            .with_raw_data(DataValue::map([
                ("tag", DataValue::map([("level", DataValue::Int(5))])),
                ("ownerUUID", DataValue::from("abc123")),
            ]))
    }

    #[test]
    fn test_empty_criteria_match_everything() {
        let c = Criteria::empty();
        for item in [sword(), Item::unidentified()] {
            let outcome = c.evaluate(&item);
            assert_eq!(outcome, MatchOutcome::default());
            assert!(outcome.is_match());
        }
    }

    #[test]
    fn test_threshold_rule() {
        let c = criteria("material: diamond_*\nname: Durandal");
        let outcome = c.evaluate(&sword());
        assert_eq!((outcome.required, outcome.passed), (2, 1));
        assert!(!c.is_matching(&sword()));
    }

    #[test]
    fn test_all_criteria_pass() {
        let c = criteria(
            "material: diamond_*\nname: \"*calibur\"\ncustom-model-data: 7\nnbt-value: tag.level=5",
        );
        let outcome = c.evaluate(&sword());
        assert_eq!((outcome.required, outcome.passed), (4, 4));
    }

    #[test]
    fn test_every_criterion_runs_after_failure() {
        let c = criteria("material: stone\nname: Excalibur\ncustom-model-data: 7");
        assert_eq!(c.evaluate(&sword()).passed, 2);
    }

    #[test]
    fn test_unresolved_identifier_fails() {
        let c = criteria("material: \"*\"");
        assert!(!c.is_matching(&Item::unidentified()));
        assert!(c.is_matching(&Item::new("")));
    }

    #[test]
    fn test_missing_display_name_fails() {
        let c = criteria("name: \"*\"");
        assert!(!c.is_matching(&Item::new("STONE")));
    }

    #[test]
    fn test_custom_model_data_truncates() {
        let seven = criteria("custom-model-data: 7");
        assert!(seven.is_matching(&Item::new("X").with_numeric_tag(vec![7.9])));
        assert!(!seven.is_matching(&Item::new("X").with_numeric_tag(vec![8.0])));
        assert!(!seven.is_matching(&Item::new("X").with_numeric_tag(vec![])));
        assert!(!seven.is_matching(&Item::new("X")));

        let negative = criteria("custom-model-data: -1");
        assert!(negative.is_matching(&Item::new("X").with_numeric_tag(vec![-1.5])));
    }

    #[test]
    fn test_nbt_value_entry_search() {
        assert!(criteria("nbt-value: tag.level=5").is_matching(&sword()));
        assert!(!criteria("nbt-value: tag.level=6").is_matching(&sword()));
        assert!(criteria("nbt-value: \"tag.*=5\"").is_matching(&sword()));
    }

    #[test]
    fn test_nbt_value_mapping_requires_every_entry() {
        assert!(criteria("nbt-value:\n  tag.level: 5\n  ownerUUID: abc*").is_matching(&sword()));
        assert!(!criteria("nbt-value:\n  tag.level: 5\n  ownerUUID: xyz").is_matching(&sword()));
        assert!(criteria("nbt-value: {}").is_matching(&sword()));
    }

    #[test]
    fn test_nbt_value_bare_glob() {
        assert!(criteria("nbt-value: \"abc*\"").is_matching(&sword()));
        assert!(!criteria("nbt-value: \"xyz*\"").is_matching(&sword()));
    }

    #[test]
    fn test_nbt_criteria_without_raw_data() {
        let item = Item::new("STONE");
        assert!(!criteria("nbt-value: \"*\"").is_matching(&item));
        assert!(criteria("nbt-value: {}").is_matching(&item));
    }

    #[test]
    fn test_nbt_value_fallback_blob() {
        let item = Item::new("STONE").with_raw_data(DataValue::map([(
            "PublicBukkitValues",
            DataValue::map([("Internal", DataValue::from("{ownerUUID=abc123, other=1}"))]),
        )]));
        assert!(criteria("nbt-value: \"owner*=abc*\"").is_matching(&item));
        assert!(!criteria("nbt-value: \"owner*=xyz*\"").is_matching(&item));
    }

    #[cfg(feature = "nbt-tags")]
    #[test]
    fn test_nbt_tags() {
        let item = Item::new("STONE").with_raw_data(DataValue::map([(
            "tag",
            DataValue::map([("Enchantments", DataValue::from(vec!["sharpness"]))]),
        )]));
        assert!(criteria("nbt-tags: [enchant]").is_matching(&item));
        assert!(!criteria("nbt-tags: [enchant, owner]").is_matching(&item));
        assert!(criteria("nbt-tags: [\"\", \" \"]").is_matching(&item));
    }

    #[test]
    fn test_lenient_dropped_criterion_is_absent() {
        let value: DataValue = serde_yaml::from_str("material: stone\ncustom-model-data: \"7\"").unwrap();
        let c = Criteria::from_value(&value, Strictness::Lenient).unwrap();
        let outcome = c.evaluate(&Item::new("STONE"));
        assert_eq!((outcome.required, outcome.passed), (1, 1));
    }

    #[test]
    fn test_outcome_display() {
        let outcome = MatchOutcome {
            required: 3,
            passed: 2,
        };
        assert_eq!(outcome.to_string(), "2/3 criteria passed");
    }
}
