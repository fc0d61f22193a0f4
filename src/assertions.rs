//! Fluent assertions over metric family snapshots
//!
//! Start with [`assert_that`], chain the checks shared by every family
//! ([`FamilyAssert`]), then narrow the chain with a type check. Each type check
//! returns the verifier for that kind of family, which only offers the
//! operations that make sense for it:
//!
//! | type check                                  | verifier                |
//! |---------------------------------------------|-------------------------|
//! | `has_type_of_counter` / `has_type_of_gauge` | [`CounterAndGaugeAssert`] |
//! | `has_type_of_summary`                       | [`SummaryAssert`]       |
//! | `has_type_of_histogram`                     | [`HistogramAssert`]     |
//! | `has_type_of_info`                          | [`InfoAssert`]          |
//!
//! [`MetricFamilySamplesAssert::specialize`] picks the verifier from the
//! family's actual type instead and returns it as a [`TypedAssert`].
//!
//! Failed checks panic with a message describing the mismatch and listing the
//! family's samples.
//!
//! ```rust
//! use tyl_metrics_assert::{assert_that, FamilyAssert, MetricFamilySamples, MetricType, Sample, SumAndCountAssert};
//!
//! let family = MetricFamilySamples::new("latency", MetricType::Histogram, "help").with_samples([
//!     Sample::new("latency_bucket", &["le"], &["1.0"], 1.0),
//!     Sample::new("latency_bucket", &["le"], &["+Inf"], 2.0),
//!     Sample::new("latency_count", &[], &[], 2.0),
//!     Sample::new("latency_sum", &[], &[], 3.5),
//! ]);
//!
//! assert_that(&family)
//!     .has_sample_size(4)
//!     .has_sample_label_names(&[])
//!     .has_type_of_histogram()
//!     .has_bucket_value(&[], 1.0, 1.0)
//!     .has_bucket_value(&[], f64::INFINITY, 2.0)
//!     .has_sample_count_value(&[], 2.0)
//!     .has_sample_sum_value(&[], 3.5);
//! ```

use crate::matchers::ValueMatcher;
use crate::types::{MetricFamilySamples, MetricType, Sample};
use crate::utils::{double_to_go_string, format_label_pairs, format_samples};

/// Start an assertion chain for `family`
pub fn assert_that(family: &MetricFamilySamples) -> MetricFamilySamplesAssert<'_> {
    MetricFamilySamplesAssert { actual: family }
}

#[track_caller]
fn fail(message: String) -> ! {
    panic!("{message}")
}

/// Checks shared by every verifier
pub trait FamilyAssert: Sized {
    /// The family under test
    fn actual(&self) -> &MetricFamilySamples;

    /// Verifies the family type
    #[track_caller]
    fn has_type(self, metric_type: MetricType) -> Self {
        let actual = self.actual();
        if actual.metric_type != metric_type {
            fail(format!(
                "Expected MetricFamilySamples's {} type to be <{}> but was <{}>",
                actual.name, metric_type, actual.metric_type
            ));
        }
        self
    }

    /// Verifies that one or more samples exist
    ///
    /// Families without label names always have their zero sample; labelled
    /// families only have samples once a child was recorded.
    #[track_caller]
    fn has_any_samples(self) -> Self {
        let actual = self.actual();
        if actual.samples.is_empty() {
            fail(format!(
                "Expected one or more MetricFamilySamples {} samples but samples <[]> are empty",
                actual.name
            ));
        }
        self
    }

    /// Verifies the number of samples
    #[track_caller]
    fn has_sample_size(self, size: usize) -> Self {
        let actual = self.actual();
        if actual.samples.len() != size {
            fail(format!(
                "Expected MetricFamilySamples's {} samples with size {} but is with size {} .\nSamples are :\n{}",
                actual.name,
                size,
                actual.samples.len(),
                format_samples(&actual.samples)
            ));
        }
        self
    }

    /// Verifies the label names, in any order
    ///
    /// The names are taken from the first sample carrying the family's plain
    /// value: `<name>_count` for summaries and histograms, `<name>_info` for
    /// info families and `<name>` otherwise.
    #[track_caller]
    fn has_sample_label_names(self, label_names: &[&str]) -> Self {
        let this = self.has_any_samples();
        let actual = this.actual();

        let sample_name = label_sample_name(actual);
        let Some(found) = actual.label_names_of(&sample_name) else {
            fail(format!(
                "Expected MetricFamilySamples's {} to have a sample named {} in samples :\n{}",
                actual.name,
                sample_name,
                format_samples(&actual.samples)
            ));
        };

        let mut found_sorted: Vec<&str> = found.iter().map(String::as_str).collect();
        let mut expected_sorted = label_names.to_vec();
        found_sorted.sort_unstable();
        expected_sorted.sort_unstable();

        if found_sorted != expected_sorted {
            if label_names.is_empty() {
                fail(format!(
                    "Expected MetricFamilySamples's {} samples to have no labels but found [{}]",
                    actual.name,
                    found.join(", ")
                ));
            }
            fail(format!(
                "Expected MetricFamilySamples's {} samples to have labels [{}] in any order but found [{}]\nSamples are:\n{}",
                actual.name,
                label_names.join(", "),
                found.join(", "),
                format_samples(&actual.samples)
            ));
        }

        this
    }
}

fn label_sample_name(family: &MetricFamilySamples) -> String {
    match family.metric_type {
        t if t.has_sum_and_count() => format!("{}_count", family.name),
        MetricType::Info => format!("{}_info", family.name),
        _ => family.name.clone(),
    }
}

/// Find the sample `sample_name{label_values}` or fail
///
/// Label names are taken from the first sample called `sample_name`. Returns
/// the sample with its rendered label pairs.
#[track_caller]
fn expect_sample<'f>(
    family: &'f MetricFamilySamples,
    sample_name: &str,
    label_values: &[&str],
) -> (&'f Sample, String) {
    if family.samples.is_empty() {
        fail(format!(
            "Expected one or more MetricFamilySamples {} samples but samples <[]> are empty",
            family.name
        ));
    }

    let Some(label_names) = family.label_names_of(sample_name) else {
        fail(format!(
            "Expected a sample named {} in samples :\n{}",
            sample_name,
            format_samples(&family.samples)
        ));
    };

    let labels = format_label_pairs(label_names, label_values);
    match family.find_sample(sample_name, label_names, label_values) {
        Some(sample) => (sample, labels),
        None => fail(format!(
            "Expected {}{{{}}} sample in samples :\n{}",
            sample_name,
            labels,
            format_samples(&family.samples)
        )),
    }
}

#[track_caller]
fn verify_sample_value(
    family: &MetricFamilySamples,
    sample_name: &str,
    label_values: &[&str],
    expected: &impl ValueMatcher,
) {
    let (sample, labels) = expect_sample(family, sample_name, label_values);
    if !expected.matches(sample.value) {
        fail(format!(
            "Unexpected value for {}{{{}}} : expected {} but was <{}>",
            sample_name,
            labels,
            expected.describe(),
            double_to_go_string(sample.value)
        ));
    }
}

fn with_extra_value<'v>(label_values: &[&'v str], extra: &'v str) -> Vec<&'v str> {
    let mut extended = Vec::with_capacity(label_values.len() + 1);
    extended.extend_from_slice(label_values);
    extended.push(extra);
    extended
}

/// Generic verifier returned by [`assert_that`]
#[derive(Debug, Clone, Copy)]
pub struct MetricFamilySamplesAssert<'a> {
    actual: &'a MetricFamilySamples,
}

impl<'a> FamilyAssert for MetricFamilySamplesAssert<'a> {
    fn actual(&self) -> &MetricFamilySamples {
        self.actual
    }
}

impl<'a> MetricFamilySamplesAssert<'a> {
    /// Verifies the family is a counter
    #[track_caller]
    pub fn has_type_of_counter(self) -> CounterAndGaugeAssert<'a> {
        CounterAndGaugeAssert {
            actual: self.has_type(MetricType::Counter).actual,
        }
    }

    /// Verifies the family is a gauge
    #[track_caller]
    pub fn has_type_of_gauge(self) -> CounterAndGaugeAssert<'a> {
        CounterAndGaugeAssert {
            actual: self.has_type(MetricType::Gauge).actual,
        }
    }

    /// Verifies the family is a summary
    #[track_caller]
    pub fn has_type_of_summary(self) -> SummaryAssert<'a> {
        SummaryAssert {
            actual: self.has_type(MetricType::Summary).actual,
        }
    }

    /// Verifies the family is a histogram
    #[track_caller]
    pub fn has_type_of_histogram(self) -> HistogramAssert<'a> {
        HistogramAssert {
            actual: self.has_type(MetricType::Histogram).actual,
        }
    }

    /// Verifies the family is an info metric
    #[track_caller]
    pub fn has_type_of_info(self) -> InfoAssert<'a> {
        InfoAssert {
            actual: self.has_type(MetricType::Info).actual,
        }
    }

    /// Picks the verifier matching the family's actual type
    ///
    /// Panics for types without a dedicated verifier (state sets, gauge
    /// histograms and unknown families).
    #[track_caller]
    pub fn specialize(self) -> TypedAssert<'a> {
        let actual = self.actual;
        match actual.metric_type {
            MetricType::Counter | MetricType::Gauge => {
                TypedAssert::CounterOrGauge(CounterAndGaugeAssert { actual })
            }
            MetricType::Summary => TypedAssert::Summary(SummaryAssert { actual }),
            MetricType::Histogram => TypedAssert::Histogram(HistogramAssert { actual }),
            MetricType::Info => TypedAssert::Info(InfoAssert { actual }),
            other => fail(format!(
                "MetricFamilySamples's {} has type <{}> which has no specialized assertions",
                actual.name, other
            )),
        }
    }
}

/// The closed set of type-specialized verifiers
#[derive(Debug, Clone, Copy)]
pub enum TypedAssert<'a> {
    CounterOrGauge(CounterAndGaugeAssert<'a>),
    Summary(SummaryAssert<'a>),
    Histogram(HistogramAssert<'a>),
    Info(InfoAssert<'a>),
}

impl<'a> TypedAssert<'a> {
    /// The family type the verifier was chosen for
    pub fn metric_type(&self) -> MetricType {
        match self {
            TypedAssert::CounterOrGauge(a) => a.actual.metric_type,
            TypedAssert::Summary(a) => a.actual.metric_type,
            TypedAssert::Histogram(a) => a.actual.metric_type,
            TypedAssert::Info(a) => a.actual.metric_type,
        }
    }
}

/// Verifier for counter and gauge families
#[derive(Debug, Clone, Copy)]
pub struct CounterAndGaugeAssert<'a> {
    actual: &'a MetricFamilySamples,
}

impl<'a> FamilyAssert for CounterAndGaugeAssert<'a> {
    fn actual(&self) -> &MetricFamilySamples {
        self.actual
    }
}

impl<'a> CounterAndGaugeAssert<'a> {
    /// Verifies a sample with the given label values exists, whatever its value
    #[track_caller]
    pub fn has_sample(self, label_values: &[&str]) -> Self {
        expect_sample(self.actual, &self.actual.name, label_values);
        self
    }

    /// Verifies the value of the sample with the given label values
    ///
    /// Pass `&[]` for families without labels.
    #[track_caller]
    pub fn has_sample_value(self, label_values: &[&str], expected: impl ValueMatcher) -> Self {
        verify_sample_value(self.actual, &self.actual.name, label_values, &expected);
        self
    }
}

/// Sum, count and created checks shared by summaries and histograms
pub trait SumAndCountAssert: FamilyAssert {
    /// Verifies the `_sum` sample
    #[track_caller]
    fn has_sample_sum_value(self, label_values: &[&str], expected: impl ValueMatcher) -> Self {
        let actual = self.actual();
        verify_sample_value(actual, &format!("{}_sum", actual.name), label_values, &expected);
        self
    }

    /// Verifies the `_count` sample
    #[track_caller]
    fn has_sample_count_value(self, label_values: &[&str], expected: impl ValueMatcher) -> Self {
        let actual = self.actual();
        verify_sample_value(actual, &format!("{}_count", actual.name), label_values, &expected);
        self
    }

    /// Verifies the `_created` sample
    #[track_caller]
    fn has_sample_created_value(self, label_values: &[&str], expected: impl ValueMatcher) -> Self {
        let actual = self.actual();
        verify_sample_value(actual, &format!("{}_created", actual.name), label_values, &expected);
        self
    }
}

/// Verifier for summary families
#[derive(Debug, Clone, Copy)]
pub struct SummaryAssert<'a> {
    actual: &'a MetricFamilySamples,
}

impl<'a> FamilyAssert for SummaryAssert<'a> {
    fn actual(&self) -> &MetricFamilySamples {
        self.actual
    }
}

impl<'a> SumAndCountAssert for SummaryAssert<'a> {}

impl<'a> SummaryAssert<'a> {
    /// Verifies the value exported for `quantile`
    ///
    /// Quantiles without observations are `NaN`, which `f64::NAN` matches.
    #[track_caller]
    pub fn has_quantile_value(
        self,
        label_values: &[&str],
        quantile: f64,
        expected: impl ValueMatcher,
    ) -> Self {
        let quantile = double_to_go_string(quantile);
        let extended = with_extra_value(label_values, &quantile);
        verify_sample_value(self.actual, &self.actual.name, &extended, &expected);
        self
    }
}

/// Verifier for histogram families
#[derive(Debug, Clone, Copy)]
pub struct HistogramAssert<'a> {
    actual: &'a MetricFamilySamples,
}

impl<'a> FamilyAssert for HistogramAssert<'a> {
    fn actual(&self) -> &MetricFamilySamples {
        self.actual
    }
}

impl<'a> SumAndCountAssert for HistogramAssert<'a> {}

impl<'a> HistogramAssert<'a> {
    /// Verifies the cumulative count of the bucket with upper bound `le`
    #[track_caller]
    pub fn has_bucket_value(self, label_values: &[&str], le: f64, expected: impl ValueMatcher) -> Self {
        let le = double_to_go_string(le);
        let extended = with_extra_value(label_values, &le);
        verify_sample_value(
            self.actual,
            &format!("{}_bucket", self.actual.name),
            &extended,
            &expected,
        );
        self
    }
}

/// Verifier for info families
#[derive(Debug, Clone, Copy)]
pub struct InfoAssert<'a> {
    actual: &'a MetricFamilySamples,
}

impl<'a> FamilyAssert for InfoAssert<'a> {
    fn actual(&self) -> &MetricFamilySamples {
        self.actual
    }
}

impl<'a> InfoAssert<'a> {
    /// Verifies the info sample carries these label values
    #[track_caller]
    pub fn has_info_labels(self, label_values: &[&str]) -> Self {
        verify_sample_value(
            self.actual,
            &format!("{}_info", self.actual.name),
            label_values,
            &1.0,
        );
        self
    }
}
