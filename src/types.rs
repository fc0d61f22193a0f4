//! Core domain types for metric snapshots and instrumentation
//!
//! Two groups of value objects live here:
//!
//! - the **snapshot model** (`MetricType`, `Sample`, `MetricFamilySamples`)
//!   that assertions inspect, and
//! - the **instrumentation model** (`MetricDefinition`, `MetricRequest`) that
//!   feeds the in-memory registry producing those snapshots.

use crate::errors::from_serde_json_error;
use crate::utils::{double_to_go_string, format_label_pairs};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type alias for request labels - a map of string key-value pairs
pub type Labels = HashMap<String, String>;

/// Default histogram bucket upper bounds (`+Inf` is always appended)
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Enumeration of metric family types found in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Counter - Monotonically increasing value (requests, errors, bytes sent)
    Counter,

    /// Gauge - Value that can go up or down (memory usage, active connections)
    Gauge,

    /// Summary - Count, sum and client-side quantiles of observations
    Summary,

    /// Histogram - Cumulative bucket counts, count and sum of observations
    Histogram,

    /// Info - Constant `1` sample whose labels carry the information
    Info,

    /// StateSet - One sample per state, `1` for the active state
    StateSet,

    /// GaugeHistogram - Histogram whose buckets can go down
    GaugeHistogram,

    /// Unknown - Untyped samples
    Unknown,
}

impl MetricType {
    /// Whether families of this type carry `_count` / `_sum` samples
    pub fn has_sum_and_count(&self) -> bool {
        matches!(
            self,
            MetricType::Summary | MetricType::Histogram | MetricType::GaugeHistogram
        )
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricType::Counter => write!(f, "COUNTER"),
            MetricType::Gauge => write!(f, "GAUGE"),
            MetricType::Summary => write!(f, "SUMMARY"),
            MetricType::Histogram => write!(f, "HISTOGRAM"),
            MetricType::Info => write!(f, "INFO"),
            MetricType::StateSet => write!(f, "STATE_SET"),
            MetricType::GaugeHistogram => write!(f, "GAUGE_HISTOGRAM"),
            MetricType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A single exported value of a metric family
///
/// `label_names` and `label_values` are parallel: the value at index `i`
/// belongs to the name at index `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Sample name, e.g. `http_latency_bucket`
    pub name: String,

    /// Ordered label names
    #[serde(default)]
    pub label_names: Vec<String>,

    /// Label values in the same order as `label_names`
    #[serde(default)]
    pub label_values: Vec<String>,

    /// The sample value
    pub value: f64,

    /// Optional exposition timestamp (Unix epoch milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
}

impl Sample {
    /// Create a new sample without timestamp
    pub fn new(name: impl Into<String>, label_names: &[&str], label_values: &[&str], value: f64) -> Self {
        Self {
            name: name.into(),
            label_names: label_names.iter().map(|s| s.to_string()).collect(),
            label_values: label_values.iter().map(|s| s.to_string()).collect(),
            value,
            timestamp_ms: None,
        }
    }

    /// Create a sample from owned label vectors
    pub fn from_parts(
        name: impl Into<String>,
        label_names: Vec<String>,
        label_values: Vec<String>,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            label_names,
            label_values,
            value,
            timestamp_ms: None,
        }
    }

    /// Attach an exposition timestamp
    pub fn with_timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{{{}}} {}",
            self.name,
            format_label_pairs(&self.label_names, &self.label_values),
            double_to_go_string(self.value)
        )
    }
}

/// Snapshot of one named metric: its type, help text and all current samples
///
/// ## Example Usage
/// ```rust
/// use tyl_metrics_assert::{MetricFamilySamples, MetricType, Sample};
///
/// let family = MetricFamilySamples::new("http_requests", MetricType::Counter, "Requests served")
///     .with_sample(Sample::new("http_requests", &["method"], &["GET"], 3.0));
/// assert_eq!(family.samples.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFamilySamples {
    /// The family name
    pub name: String,

    /// The family type
    #[serde(rename = "type")]
    pub metric_type: MetricType,

    /// Help text
    #[serde(default)]
    pub help: String,

    /// All samples of the family
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl MetricFamilySamples {
    /// Create a family without samples
    pub fn new(name: impl Into<String>, metric_type: MetricType, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metric_type,
            help: help.into(),
            samples: Vec::new(),
        }
    }

    /// Add a sample
    pub fn with_sample(mut self, sample: Sample) -> Self {
        self.samples.push(sample);
        self
    }

    /// Add several samples
    pub fn with_samples(mut self, samples: impl IntoIterator<Item = Sample>) -> Self {
        self.samples.extend(samples);
        self
    }

    /// Distinct sample names in first-seen order
    pub fn sample_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for sample in &self.samples {
            if !names.contains(&sample.name.as_str()) {
                names.push(&sample.name);
            }
        }
        names
    }

    /// Label names of the first sample called `sample_name`
    pub fn label_names_of(&self, sample_name: &str) -> Option<&[String]> {
        self.samples
            .iter()
            .find(|s| s.name == sample_name)
            .map(|s| s.label_names.as_slice())
    }

    /// Find a sample by name, label names and label values
    pub fn find_sample(
        &self,
        sample_name: &str,
        label_names: &[String],
        label_values: &[&str],
    ) -> Option<&Sample> {
        self.samples.iter().find(|s| {
            s.name == sample_name
                && s.label_names.as_slice() == label_names
                && s.label_values.len() == label_values.len()
                && s.label_values.iter().zip(label_values).all(|(a, b)| a == b)
        })
    }

    /// Parse a JSON array of families
    ///
    /// # Example
    /// ```rust
    /// use tyl_metrics_assert::{MetricFamilySamples, MetricType};
    ///
    /// let json = r#"[{"name": "up", "type": "gauge", "samples": [{"name": "up", "value": 1.0}]}]"#;
    /// let families = MetricFamilySamples::from_json(json).unwrap();
    /// assert_eq!(families[0].metric_type, MetricType::Gauge);
    /// ```
    pub fn from_json(json: &str) -> Result<Vec<Self>> {
        serde_json::from_str(json).map_err(from_serde_json_error)
    }

    /// Serialize families to a JSON array
    pub fn to_json(families: &[Self]) -> Result<String> {
        serde_json::to_string(families).map_err(from_serde_json_error)
    }
}

/// Declaration of a metric family for the in-memory registry
///
/// ## Example Usage
/// ```rust
/// use tyl_metrics_assert::MetricDefinition;
///
/// let definition = MetricDefinition::histogram("request_duration_seconds")
///     .with_help("Request latency")
///     .with_label_names(["route"])
///     .with_buckets([0.1, 0.5, 1.0]);
/// assert_eq!(definition.buckets(), &[0.1, 0.5, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    name: String,
    metric_type: MetricType,
    help: String,
    label_names: Vec<String>,
    buckets: Vec<f64>,
    quantiles: Vec<f64>,
}

impl MetricDefinition {
    /// Declare a counter family
    pub fn counter(name: impl Into<String>) -> Self {
        Self::new(name.into(), MetricType::Counter)
    }

    /// Declare a gauge family
    pub fn gauge(name: impl Into<String>) -> Self {
        Self::new(name.into(), MetricType::Gauge)
    }

    /// Declare a summary family (no quantiles unless configured)
    pub fn summary(name: impl Into<String>) -> Self {
        Self::new(name.into(), MetricType::Summary)
    }

    /// Declare a histogram family with the default buckets
    pub fn histogram(name: impl Into<String>) -> Self {
        let mut definition = Self::new(name.into(), MetricType::Histogram);
        definition.buckets = DEFAULT_BUCKETS.to_vec();
        definition
    }

    /// Declare an info family; its label names are the info keys
    pub fn info(name: impl Into<String>) -> Self {
        Self::new(name.into(), MetricType::Info)
    }

    fn new(name: String, metric_type: MetricType) -> Self {
        Self {
            name,
            metric_type,
            help: String::new(),
            label_names: Vec::new(),
            buckets: Vec::new(),
            quantiles: Vec::new(),
        }
    }

    /// Set the help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Set the ordered label names
    pub fn with_label_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the histogram bucket upper bounds (without `+Inf`)
    pub fn with_buckets(mut self, buckets: impl IntoIterator<Item = f64>) -> Self {
        self.buckets = buckets.into_iter().collect();
        self
    }

    /// Set the summary quantiles
    pub fn with_quantiles(mut self, quantiles: impl IntoIterator<Item = f64>) -> Self {
        self.quantiles = quantiles.into_iter().collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    pub fn quantiles(&self) -> &[f64] {
        &self.quantiles
    }
}

/// What a request does to its family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RequestKind {
    /// Add to a counter
    Increment(f64),

    /// Set a gauge
    Set(f64),

    /// Record an observation into a histogram or summary
    Observe(f64),

    /// Replace the info labels
    Info,
}

/// One instrumentation event applied to a registered family
///
/// ## Example Usage
/// ```rust
/// use tyl_metrics_assert::MetricRequest;
///
/// let request = MetricRequest::counter("http_requests_total", 1.0)
///     .with_label("method", "GET")
///     .with_label("status", "200");
/// assert_eq!(request.labels().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRequest {
    name: String,
    kind: RequestKind,
    labels: Labels,
}

impl MetricRequest {
    /// Increment a counter by `amount`
    pub fn counter(name: impl Into<String>, amount: f64) -> Self {
        Self::new(name.into(), RequestKind::Increment(amount))
    }

    /// Set a gauge to `value`
    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self::new(name.into(), RequestKind::Set(value))
    }

    /// Observe `value` into a histogram or summary
    pub fn observe(name: impl Into<String>, value: f64) -> Self {
        Self::new(name.into(), RequestKind::Observe(value))
    }

    /// Set the labels of an info family
    pub fn info(name: impl Into<String>) -> Self {
        Self::new(name.into(), RequestKind::Info)
    }

    fn new(name: String, kind: RequestKind) -> Self {
        Self {
            name,
            kind,
            labels: Labels::new(),
        }
    }

    /// Add a label to the request
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add multiple labels to the request
    pub fn with_labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in labels {
            self.labels.insert(key.into(), value.into());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram_family() -> MetricFamilySamples {
        MetricFamilySamples::new("latency", MetricType::Histogram, "help").with_samples([
            Sample::new("latency_bucket", &["route", "le"], &["/a", "1.0"], 1.0),
            Sample::new("latency_bucket", &["route", "le"], &["/a", "+Inf"], 2.0),
            Sample::new("latency_count", &["route"], &["/a"], 2.0),
            Sample::new("latency_sum", &["route"], &["/a"], 3.5),
        ])
    }

    #[test]
    fn test_metric_types_display() {
        assert_eq!(MetricType::Counter.to_string(), "COUNTER");
        assert_eq!(MetricType::Histogram.to_string(), "HISTOGRAM");
        assert_eq!(MetricType::StateSet.to_string(), "STATE_SET");
        assert_eq!(MetricType::GaugeHistogram.to_string(), "GAUGE_HISTOGRAM");
    }

    #[test]
    fn test_has_sum_and_count() {
        assert!(MetricType::Summary.has_sum_and_count());
        assert!(MetricType::Histogram.has_sum_and_count());
        assert!(!MetricType::Counter.has_sum_and_count());
        assert!(!MetricType::Info.has_sum_and_count());
    }

    #[test]
    fn test_sample_display() {
        let sample = Sample::new("requests", &["a", "b"], &["x", "y"], 42.0);
        assert_eq!(sample.to_string(), "requests{a=x, b=y} 42.0");

        let unlabelled = Sample::new("up", &[], &[], f64::NAN);
        assert_eq!(unlabelled.to_string(), "up{} NaN");
    }

    #[test]
    fn test_sample_names_first_seen_order() {
        let family = histogram_family();
        assert_eq!(
            family.sample_names(),
            vec!["latency_bucket", "latency_count", "latency_sum"]
        );
    }

    #[test]
    fn test_label_names_of() {
        let family = histogram_family();
        let bucket_labels = family.label_names_of("latency_bucket").unwrap();
        assert_eq!(bucket_labels, ["route".to_string(), "le".to_string()]);
        assert!(family.label_names_of("latency_created").is_none());
    }

    #[test]
    fn test_find_sample() {
        let family = histogram_family();
        let names = vec!["route".to_string(), "le".to_string()];

        let sample = family.find_sample("latency_bucket", &names, &["/a", "+Inf"]).unwrap();
        assert_eq!(sample.value, 2.0);

        assert!(family.find_sample("latency_bucket", &names, &["/b", "+Inf"]).is_none());
        assert!(family.find_sample("latency_bucket", &names, &["/a"]).is_none());
        assert!(family
            .find_sample("latency_bucket", &["route".to_string()], &["/a"])
            .is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let families = vec![histogram_family()];
        let json = MetricFamilySamples::to_json(&families).unwrap();
        assert!(json.contains("\"type\":\"histogram\""));

        let parsed = MetricFamilySamples::from_json(&json).unwrap();
        assert_eq!(parsed, families);
    }

    #[test]
    fn test_sample_timestamp_serialization() {
        let stamped = Sample::new("up", &[], &[], 1.0).with_timestamp_ms(1_700_000_000_123);
        let plain = Sample::new("up", &[], &[], 1.0);
        let family = MetricFamilySamples::new("up", MetricType::Gauge, "")
            .with_samples([stamped.clone(), plain.clone()]);

        let json = MetricFamilySamples::to_json(&[family]).unwrap();
        assert!(json.contains("\"timestamp_ms\":1700000000123"));
        assert_eq!(json.matches("timestamp_ms").count(), 1);

        let parsed = MetricFamilySamples::from_json(&json).unwrap();
        assert_eq!(parsed[0].samples[0].timestamp_ms, Some(1_700_000_000_123));
        assert_eq!(parsed[0].samples[0], stamped);
        assert_eq!(parsed[0].samples[1].timestamp_ms, None);
        assert_eq!(parsed[0].samples[1], plain);
    }

    #[test]
    fn test_from_json_defaults_and_errors() {
        let json = r#"[{"name": "build", "type": "info"}]"#;
        let parsed = MetricFamilySamples::from_json(json).unwrap();
        assert_eq!(parsed[0].help, "");
        assert!(parsed[0].samples.is_empty());

        let error = MetricFamilySamples::from_json("not json").unwrap_err();
        assert!(error.to_string().contains("json"));
    }

    #[test]
    fn test_definition_builders() {
        let histogram = MetricDefinition::histogram("latency");
        assert_eq!(histogram.metric_type(), MetricType::Histogram);
        assert_eq!(histogram.buckets(), &DEFAULT_BUCKETS);

        let summary = MetricDefinition::summary("sizes")
            .with_help("Payload sizes")
            .with_label_names(["route", "method"])
            .with_quantiles([0.5, 0.9]);
        assert_eq!(summary.help(), "Payload sizes");
        assert_eq!(summary.label_names(), ["route".to_string(), "method".to_string()]);
        assert_eq!(summary.quantiles(), &[0.5, 0.9]);
        assert!(summary.buckets().is_empty());
    }

    #[test]
    fn test_request_builders() {
        let request = MetricRequest::observe("latency", 0.25)
            .with_labels([("route", "/a"), ("method", "GET")]);
        assert_eq!(request.name(), "latency");
        assert_eq!(request.kind(), RequestKind::Observe(0.25));
        assert_eq!(request.labels().get("route"), Some(&"/a".to_string()));

        assert_eq!(MetricRequest::counter("c", 2.0).kind(), RequestKind::Increment(2.0));
        assert_eq!(MetricRequest::gauge("g", -1.0).kind(), RequestKind::Set(-1.0));
        assert_eq!(MetricRequest::info("i").kind(), RequestKind::Info);
    }
}
