//! Validation and formatting utilities
//!
//! This module provides validation functions for metric names, label names
//! and values, together with the formatting helpers used to render samples in
//! assertion messages.

use super::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

// Maximum allowed lengths for various metric components
const MAX_METRIC_NAME_LENGTH: usize = 255;
const MAX_LABEL_NAME_LENGTH: usize = 128;
const MAX_LABEL_VALUE_LENGTH: usize = 1024;
const MAX_LABELS_COUNT: usize = 32;

lazy_static! {
    static ref METRIC_NAME_REGEX: Regex = Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").unwrap();
    static ref LABEL_NAME_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

/// Validate a metric name
///
/// Ensures metric names follow standard conventions:
/// - Must not be empty
/// - Must start with a letter, underscore or colon
/// - Can contain letters, numbers, underscores, and colons
/// - Must be within reasonable length limits
///
/// # Examples
/// ```rust
/// use tyl_metrics_assert::validate_metric_name;
///
/// assert!(validate_metric_name("http_requests_total").is_ok());
/// assert!(validate_metric_name("").is_err());
/// ```
pub fn validate_metric_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(metrics_error("metric_name", "Metric name cannot be empty"));
    }

    if name.len() > MAX_METRIC_NAME_LENGTH {
        return Err(metrics_error(
            "metric_name",
            format!("Metric name too long (max {MAX_METRIC_NAME_LENGTH} chars)"),
        ));
    }

    if !METRIC_NAME_REGEX.is_match(name) {
        return Err(metrics_error(
            "metric_name",
            "Invalid metric name format (must match [a-zA-Z_:][a-zA-Z0-9_:]*)",
        ));
    }

    Ok(())
}

/// Validate a label name
///
/// Label names starting with a double underscore are reserved.
pub fn validate_label_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(metrics_error("label_name", "Label name cannot be empty"));
    }

    if name.len() > MAX_LABEL_NAME_LENGTH {
        return Err(metrics_error(
            "label_name",
            format!("Label name too long (max {MAX_LABEL_NAME_LENGTH} chars)"),
        ));
    }

    if name.starts_with("__") {
        return Err(metrics_error(
            "label_name",
            "Label names starting with '__' are reserved",
        ));
    }

    if !LABEL_NAME_REGEX.is_match(name) {
        return Err(metrics_error(
            "label_name",
            "Invalid label name format (must match [a-zA-Z_][a-zA-Z0-9_]*)",
        ));
    }

    Ok(())
}

/// Validate a label value
///
/// Label values can be empty but must not contain null bytes.
pub fn validate_label_value(value: &str) -> Result<()> {
    if value.len() > MAX_LABEL_VALUE_LENGTH {
        return Err(metrics_error(
            "label_value",
            format!("Label value too long (max {MAX_LABEL_VALUE_LENGTH} chars)"),
        ));
    }

    if value.contains('\0') {
        return Err(metrics_error(
            "label_value",
            "Label values cannot contain null bytes",
        ));
    }

    Ok(())
}

/// Validate the ordered label names of a metric definition
///
/// Checks the count limit, every individual name, and rejects duplicates.
pub fn validate_label_names(names: &[String]) -> Result<()> {
    if names.len() > MAX_LABELS_COUNT {
        return Err(metrics_error(
            "labels",
            format!("Too many labels (max {MAX_LABELS_COUNT})"),
        ));
    }

    for (i, name) in names.iter().enumerate() {
        validate_label_name(name)?;
        if names[..i].contains(name) {
            return Err(metrics_error(
                "labels",
                format!("Duplicate label name '{name}'"),
            ));
        }
    }

    Ok(())
}

/// Validate the labels attached to a request
pub fn validate_labels(labels: &HashMap<String, String>) -> Result<()> {
    if labels.len() > MAX_LABELS_COUNT {
        return Err(metrics_error(
            "labels",
            format!("Too many labels (max {MAX_LABELS_COUNT})"),
        ));
    }

    for (key, value) in labels {
        validate_label_name(key)?;
        validate_label_value(value)?;
    }

    Ok(())
}

/// Validate a metric value
///
/// Metric values must be finite (no NaN, Infinity).
pub fn validate_metric_value(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(metrics_error(
            "metric_value",
            "Metric values must be finite (no NaN or Infinity)",
        ));
    }

    Ok(())
}

/// Validate a counter increment
///
/// Counter increments must be finite and non-negative.
pub fn validate_counter_value(value: f64) -> Result<()> {
    validate_metric_value(value)?;

    if value < 0.0 {
        return Err(metrics_error(
            "counter_value",
            "Counter increments must be non-negative",
        ));
    }

    Ok(())
}

/// Render a float the way exposition label values such as `le` and
/// `quantile` carry it.
///
/// Infinities become `+Inf` / `-Inf`, NaN becomes `NaN`, and finite values use
/// the shortest round-trip form with at least one fractional digit.
///
/// # Examples
/// ```rust
/// use tyl_metrics_assert::double_to_go_string;
///
/// assert_eq!(double_to_go_string(f64::INFINITY), "+Inf");
/// assert_eq!(double_to_go_string(1.0), "1.0");
/// assert_eq!(double_to_go_string(0.99), "0.99");
/// ```
pub fn double_to_go_string(value: f64) -> String {
    if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:?}")
    }
}

/// Compare two sample values, treating NaN as equal to NaN
pub fn values_equal(expected: f64, actual: f64) -> bool {
    expected == actual || (expected.is_nan() && actual.is_nan())
}

/// Format label names and values as `name=value` pairs
///
/// When the two slices differ in length the missing side is left blank, so
/// partially specified label sets still render in failure messages.
///
/// # Examples
/// ```rust
/// use tyl_metrics_assert::format_label_pairs;
///
/// let names = vec!["method".to_string(), "status".to_string()];
/// assert_eq!(format_label_pairs(&names, &["GET"]), "method=GET, status=");
/// ```
pub fn format_label_pairs<N, V>(names: &[N], values: &[V]) -> String
where
    N: AsRef<str>,
    V: AsRef<str>,
{
    (0..names.len().max(values.len()))
        .map(|i| {
            format!(
                "{}={}",
                names.get(i).map(AsRef::as_ref).unwrap_or(""),
                values.get(i).map(AsRef::as_ref).unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format request labels as a string for logging
///
/// The format is `key1=value1,key2=value2`, sorted by key.
pub fn format_labels(labels: &HashMap<String, String>) -> String {
    if labels.is_empty() {
        return "{}".to_string();
    }

    let mut pairs: Vec<(&String, &String)> = labels.iter().collect();
    pairs.sort_by_key(|(k, _)| *k);

    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render samples as a bracketed, one-sample-per-line list
pub fn format_samples(samples: &[Sample]) -> String {
    let body = samples
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",\n");
    format!("[{body}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_metric_name_valid() {
        assert!(validate_metric_name("http_requests_total").is_ok());
        assert!(validate_metric_name("cpu_usage").is_ok());
        assert!(validate_metric_name("db:connection_pool_size").is_ok());
        assert!(validate_metric_name("_private_metric").is_ok());
    }

    #[test]
    fn test_validate_metric_name_invalid() {
        assert!(validate_metric_name("").is_err());
        assert!(validate_metric_name("123_invalid").is_err());
        assert!(validate_metric_name("invalid name").is_err());
        assert!(validate_metric_name("invalid-name").is_err());
        assert!(validate_metric_name(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_label_name() {
        assert!(validate_label_name("method").is_ok());
        assert!(validate_label_name("_internal").is_ok());
        assert!(validate_label_name("").is_err());
        assert!(validate_label_name("__reserved").is_err());
        assert!(validate_label_name("123invalid").is_err());
        assert!(validate_label_name("db:name").is_err());
        assert!(validate_label_name(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_label_value() {
        assert!(validate_label_value("").is_ok());
        assert!(validate_label_value("some-value").is_ok());
        assert!(validate_label_value("value\0with\0nulls").is_err());
        assert!(validate_label_value(&"x".repeat(1025)).is_err());
    }

    #[test]
    fn test_validate_label_names_rejects_duplicates() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert!(validate_label_names(&names).is_ok());

        let duplicated = vec!["a".to_string(), "a".to_string()];
        let error = validate_label_names(&duplicated).unwrap_err();
        assert!(error.to_string().contains("Duplicate label name"));

        let too_many: Vec<String> = (0..33).map(|i| format!("label_{i}")).collect();
        assert!(validate_label_names(&too_many).is_err());
    }

    #[test]
    fn test_validate_labels() {
        let mut labels = HashMap::new();
        labels.insert("method".to_string(), "GET".to_string());
        assert!(validate_labels(&labels).is_ok());

        labels.insert("__name__".to_string(), "x".to_string());
        assert!(validate_labels(&labels).is_err());
    }

    #[test]
    fn test_validate_values() {
        assert!(validate_metric_value(-123.45).is_ok());
        assert!(validate_metric_value(f64::NAN).is_err());
        assert!(validate_metric_value(f64::INFINITY).is_err());

        assert!(validate_counter_value(0.0).is_ok());
        assert!(validate_counter_value(-1.0).is_err());
        assert!(validate_counter_value(f64::NAN).is_err());
    }

    #[test]
    fn test_double_to_go_string() {
        assert_eq!(double_to_go_string(f64::INFINITY), "+Inf");
        assert_eq!(double_to_go_string(f64::NEG_INFINITY), "-Inf");
        assert_eq!(double_to_go_string(f64::NAN), "NaN");
        assert_eq!(double_to_go_string(1.0), "1.0");
        assert_eq!(double_to_go_string(5.0), "5.0");
        assert_eq!(double_to_go_string(0.5), "0.5");
        assert_eq!(double_to_go_string(0.005), "0.005");
    }

    #[test]
    fn test_values_equal() {
        assert!(values_equal(1.0, 1.0));
        assert!(values_equal(f64::NAN, f64::NAN));
        assert!(!values_equal(f64::NAN, 0.0));
        assert!(!values_equal(1.0, 2.0));
    }

    #[test]
    fn test_format_label_pairs() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(format_label_pairs(&names, &["x", "y"]), "a=x, b=y");
        assert_eq!(format_label_pairs(&names, &["x"]), "a=x, b=");
        assert_eq!(format_label_pairs::<String, &str>(&[], &["x"]), "=x");
        assert_eq!(format_label_pairs::<String, &str>(&[], &[]), "");
    }

    #[test]
    fn test_format_labels() {
        let mut labels = HashMap::new();
        labels.insert("status".to_string(), "200".to_string());
        labels.insert("method".to_string(), "GET".to_string());
        assert_eq!(format_labels(&labels), "method=GET,status=200");
        assert_eq!(format_labels(&HashMap::new()), "{}");
    }

    #[test]
    fn test_format_samples() {
        let samples = vec![
            Sample::new("requests", &["method"], &["GET"], 1.0),
            Sample::new("requests", &["method"], &["POST"], 2.0),
        ];
        assert_eq!(
            format_samples(&samples),
            "[requests{method=GET} 1.0,\nrequests{method=POST} 2.0]"
        );
        assert_eq!(format_samples(&[]), "[]");
    }
}
