//! Evaluation trace types for explaining a verdict.
//!
//! [`Criteria::trace`] runs the same evaluation as
//! [`Criteria::evaluate`](crate::Criteria::evaluate) but also records, for
//! every present criterion, what was expected, what the item offered and
//! whether it held.
//!
//! # Example
//!
//! ```
//! use itemmatch::{Criteria, Item};
//!
//! let criteria = Criteria::builder().material("stone").name("Rock").build().unwrap();
//! let trace = criteria.trace(&Item::new("STONE"));
//!
//! assert!(!trace.matched());
//! let failed: Vec<_> = trace.failures().map(|s| s.criterion).collect();
//! assert_eq!(failed, ["name"]);
//! ```

use crate::matcher::{Observed, Step};
use crate::{Criteria, FlatRecord, ItemView, MatchOutcome};
use std::fmt;

/// Placeholder for a field the item could not provide.
const MISSING: &str = "<missing>";

/// Trace of a full [`Criteria`] evaluation.
///
/// # INV: `outcome` == `evaluate()` result
///
/// The `outcome` field always equals what
/// [`Criteria::evaluate`](crate::Criteria::evaluate) returns for the same
/// item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTrace {
    /// The counts (identical to what `evaluate()` returns).
    pub outcome: MatchOutcome,
    /// One step per present criterion, in evaluation order.
    pub steps: Vec<CriterionTrace>,
}

impl MatchTrace {
    /// The verdict; equals [`Criteria::is_matching`].
    #[must_use]
    pub fn matched(&self) -> bool {
        self.outcome.is_match()
    }

    /// Steps whose criterion did not hold.
    pub fn failures(&self) -> impl Iterator<Item = &CriterionTrace> {
        self.steps.iter().filter(|s| !s.passed)
    }
}

impl fmt::Display for MatchTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{step}")?;
        }
        let verdict = if self.matched() { "match" } else { "no match" };
        write!(f, "{verdict} ({})", self.outcome)
    }
}

/// One criterion's evaluation in a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionTrace {
    /// Configuration key of the criterion (`material`, `nbt-value`, ...).
    pub criterion: &'static str,
    /// The compiled criterion as written.
    pub expected: String,
    /// What the item offered, or `None` if it could not provide the field.
    pub actual: Option<String>,
    /// Did the criterion hold?
    pub passed: bool,
}

impl fmt::Display for CriterionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "pass" } else { "FAIL" };
        write!(
            f,
            "[{status}] {}: expected {}, actual {}",
            self.criterion,
            self.expected,
            self.actual.as_deref().unwrap_or(MISSING)
        )
    }
}

impl From<Step<'_>> for CriterionTrace {
    fn from(step: Step<'_>) -> Self {
        let actual = match step.observed {
            Observed::Text(text) => text.map(str::to_owned),
            Observed::Number(n) => n.map(|n| n.to_string()),
            Observed::Record(record) => Some(describe_record(record)),
        };
        Self {
            criterion: step.criterion,
            expected: step.expected.to_string(),
            actual,
            passed: step.passed,
        }
    }
}

fn describe_record(record: &FlatRecord) -> String {
    let noun = if record.len() == 1 { "entry" } else { "entries" };
    match record.fallback_path() {
        Some(path) => format!("{} {noun}, fallback at {path}", record.len()),
        None => format!("{} {noun}", record.len()),
    }
}

impl Criteria {
    /// Evaluate with full visibility into each criterion.
    ///
    /// Costs one allocation per present criterion on top of
    /// [`evaluate`](Criteria::evaluate).
    #[must_use]
    pub fn trace<I: ItemView + ?Sized>(&self, item: &I) -> MatchTrace {
        let mut steps = Vec::with_capacity(self.len());
        let outcome = self.walk(item, |step| steps.push(CriterionTrace::from(step)));
        MatchTrace { outcome, steps }
    }
}
