//! Error handling integration for TYL metrics assertions
//!
//! This module provides helper functions for creating domain-specific errors
//! using the TYL framework error system. It follows the established TYL
//! pattern of providing semantic error constructors rather than custom error types.
//!
//! Assertion failures are not errors: they panic, like any other failed test
//! assertion. The errors below cover lookups, registry bookkeeping and
//! snapshot (de)serialization.

use super::*;

/// Create a metrics validation error
///
/// Used when metric names, label sets or values fail validation.
///
/// # Example
/// ```rust
/// use tyl_metrics_assert::metrics_error;
///
/// let error = metrics_error("metric_name", "Names cannot contain spaces");
/// assert!(error.to_string().contains("spaces"));
/// ```
pub fn metrics_error(field: impl Into<String>, message: impl Into<String>) -> TylError {
    TylError::validation(field.into(), message.into())
}

/// Create a metrics configuration error
///
/// # Example
/// ```rust
/// use tyl_metrics_assert::metrics_config_error;
///
/// let error = metrics_config_error("max_suggestions", "Must be greater than 0");
/// ```
pub fn metrics_config_error(config_key: impl Into<String>, message: impl Into<String>) -> TylError {
    TylError::configuration(format!(
        "Metrics config error for {}: {}",
        config_key.into(),
        message.into()
    ))
}

/// Create the error returned when an exact-name lookup fails
///
/// The message names the requested metric followed by the bracketed list of
/// closest known names, e.g.
/// `No MetricFamilySamples found by name http_request, closest names are [http_requests]`.
/// No space precedes the comma, unlike the Prometheus Java client's
/// `by name foo , closest names are` wording.
///
/// # Example
/// ```rust
/// use tyl_metrics_assert::metric_not_found_error;
///
/// let error = metric_not_found_error("cpu", &["cpu_seconds".to_string()]);
/// assert!(error.to_string().contains("[cpu_seconds]"));
/// ```
pub fn metric_not_found_error(name: &str, closest_names: &[String]) -> TylError {
    metrics_error(
        "metric_name",
        format!(
            "No MetricFamilySamples found by name {}, closest names are [{}]",
            name,
            closest_names.join(", ")
        ),
    )
}

/// Create a metrics registration error
///
/// Used when a metric definition cannot be registered, for example because a
/// family with the same name already exists.
pub fn metrics_registration_error(
    metric_name: impl Into<String>,
    message: impl Into<String>,
) -> TylError {
    TylError::validation(
        "metric_definition".to_string(),
        format!(
            "Metrics registration error for {}: {}",
            metric_name.into(),
            message.into()
        ),
    )
}

/// Create a metrics recording error
///
/// Used when a request cannot be applied to a registered family.
///
/// # Example
/// ```rust
/// use tyl_metrics_assert::metrics_recording_error;
///
/// let error = metrics_recording_error("http_requests_total", "Family is not registered");
/// ```
pub fn metrics_recording_error(
    metric_name: impl Into<String>,
    message: impl Into<String>,
) -> TylError {
    TylError::internal(format!(
        "Metrics recording error for {}: {}",
        metric_name.into(),
        message.into()
    ))
}

/// Create a metrics serialization error
///
/// # Example
/// ```rust
/// use tyl_metrics_assert::metrics_serialization_error;
///
/// let error = metrics_serialization_error("json", "Invalid UTF-8 sequence in metric name");
/// ```
pub fn metrics_serialization_error(
    format: impl Into<String>,
    message: impl Into<String>,
) -> TylError {
    TylError::internal(format!(
        "Metrics serialization error for {}: {}",
        format.into(),
        message.into()
    ))
}

/// Helper trait for adding metrics context to existing errors
pub trait MetricsErrorExt {
    /// Add metrics context to an existing error by wrapping it
    fn with_metrics_context(self, context: impl Into<String>) -> TylError;

    /// Add metric name context to an existing error by wrapping it
    fn with_metric_name(self, metric_name: impl Into<String>) -> TylError;
}

impl MetricsErrorExt for TylError {
    fn with_metrics_context(self, context: impl Into<String>) -> TylError {
        TylError::internal(format!("Metrics context [{}]: {}", context.into(), self))
    }

    fn with_metric_name(self, metric_name: impl Into<String>) -> TylError {
        TylError::internal(format!("Metric [{}]: {}", metric_name.into(), self))
    }
}

/// Convert a serde_json error into a metrics serialization error
///
/// Note: a helper function rather than a From impl to avoid orphan rule issues
pub fn from_serde_json_error(error: serde_json::Error) -> TylError {
    metrics_serialization_error("json", error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_error() {
        let error = metrics_error("metric_name", "Invalid characters");
        assert!(error.to_string().contains("Invalid characters"));
    }

    #[test]
    fn test_metrics_config_error() {
        let error = metrics_config_error("max_suggestions", "Out of range");
        assert!(error.to_string().contains("max_suggestions"));
        assert!(error.to_string().contains("Out of range"));
    }

    #[test]
    fn test_metric_not_found_error_lists_suggestions() {
        let suggestions = vec!["afoo".to_string(), "afoob".to_string()];
        let error = metric_not_found_error("foo", &suggestions);
        let message = error.to_string();
        assert!(message.contains("No MetricFamilySamples found by name foo"));
        assert!(message.contains("[afoo, afoob]"));
    }

    #[test]
    fn test_metric_not_found_error_without_suggestions() {
        let error = metric_not_found_error("foo", &[]);
        assert!(error.to_string().contains("closest names are []"));
    }

    #[test]
    fn test_metrics_registration_error() {
        let error = metrics_registration_error("cpu_usage", "Already registered");
        assert!(error.to_string().contains("cpu_usage"));
        assert!(error.to_string().contains("Already registered"));
    }

    #[test]
    fn test_metrics_recording_error() {
        let error = metrics_recording_error("cpu_usage", "Not registered");
        assert!(error.to_string().contains("Not registered"));
    }

    #[test]
    fn test_error_extension_trait() {
        let base_error = TylError::validation("test", "test message");
        let extended = base_error
            .with_metrics_context("histogram observation")
            .with_metric_name("http_latency");

        let error_string = extended.to_string();
        assert!(error_string.contains("http_latency"));
        assert!(error_string.contains("histogram observation"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let tyl_error = from_serde_json_error(json_error);
        assert!(tyl_error.to_string().contains("json"));
    }
}
