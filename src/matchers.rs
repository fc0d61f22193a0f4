//! Value matchers for sample assertions
//!
//! Every value-checking assertion takes an `impl ValueMatcher`. A plain `f64`
//! checks for equality; the helpers below cover tolerances and arbitrary
//! predicates.

use crate::utils::{double_to_go_string, values_equal};

/// A check applied to a sample value
pub trait ValueMatcher {
    /// Whether `actual` satisfies this matcher
    fn matches(&self, actual: f64) -> bool;

    /// Human-readable expectation used in failure messages
    fn describe(&self) -> String;
}

/// Exact equality; `NaN` matches `NaN`
impl ValueMatcher for f64 {
    fn matches(&self, actual: f64) -> bool {
        values_equal(*self, actual)
    }

    fn describe(&self) -> String {
        format!("<{}>", double_to_go_string(*self))
    }
}

/// Matches values within an absolute offset of the expected value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloseTo {
    expected: f64,
    offset: f64,
}

impl ValueMatcher for CloseTo {
    fn matches(&self, actual: f64) -> bool {
        (actual - self.expected).abs() <= self.offset
    }

    fn describe(&self) -> String {
        format!(
            "close to <{}> within offset {}",
            double_to_go_string(self.expected),
            self.offset
        )
    }
}

/// Matches values within a percentage of the expected value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithinPercentage {
    expected: f64,
    percentage: f64,
}

impl ValueMatcher for WithinPercentage {
    fn matches(&self, actual: f64) -> bool {
        (actual - self.expected).abs() <= (self.expected * self.percentage / 100.0).abs()
    }

    fn describe(&self) -> String {
        format!(
            "close to <{}> within {}%",
            double_to_go_string(self.expected),
            self.percentage
        )
    }
}

/// Matches values accepted by a predicate
pub struct Satisfies<F> {
    description: String,
    predicate: F,
}

impl<F: Fn(f64) -> bool> ValueMatcher for Satisfies<F> {
    fn matches(&self, actual: f64) -> bool {
        (self.predicate)(actual)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

/// Value within `offset` of `expected`
///
/// # Example
/// ```rust
/// use tyl_metrics_assert::{close_to, ValueMatcher};
///
/// assert!(close_to(10.0, 0.5).matches(10.4));
/// assert!(!close_to(10.0, 0.5).matches(10.6));
/// ```
pub fn close_to(expected: f64, offset: f64) -> CloseTo {
    CloseTo { expected, offset }
}

/// Value within `percentage` percent of `expected`
pub fn within_percentage(expected: f64, percentage: f64) -> WithinPercentage {
    WithinPercentage {
        expected,
        percentage,
    }
}

/// Value accepted by `predicate`, described as `description` on failure
///
/// # Example
/// ```rust
/// use tyl_metrics_assert::{satisfies, ValueMatcher};
///
/// let positive = satisfies("a positive value", |v| v > 0.0);
/// assert!(positive.matches(1.0));
/// assert_eq!(positive.describe(), "a positive value");
/// ```
pub fn satisfies<F: Fn(f64) -> bool>(description: impl Into<String>, predicate: F) -> Satisfies<F> {
    Satisfies {
        description: description.into(),
        predicate,
    }
}
