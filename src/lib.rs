//! # TYL Metrics Assert
//!
//! Fluent assertions for metric family snapshots in the TYL framework.
//!
//! Tests record metrics into any [`MetricsSource`] (usually an
//! [`InMemoryRegistry`]), look the family up by name and chain assertions over
//! the snapshot:
//!
//! - **Lookup**: exact-name lookup; a miss reports the closest known names
//! - **Assertions**: type, sample size, label names and sample values, with
//!   verifiers specialized per family type
//! - **Similarity**: Levenshtein distance and top-N closest-match ranking
//! - **Registry**: in-memory counters, gauges, summaries, histograms and info
//!   families
//!
//! ## Quick Start
//!
//! ```rust
//! use tyl_metrics_assert::{
//!     assert_that, get_metric_family_samples, FamilyAssert, InMemoryRegistry, LookupConfig,
//!     MetricDefinition, MetricRequest, RegistryConfig,
//! };
//!
//! tokio_test::block_on(async {
//!     let registry = InMemoryRegistry::new(RegistryConfig::new("checkout"));
//!     registry
//!         .register(MetricDefinition::counter("orders").with_label_names(["status"]))
//!         .await?;
//!     registry
//!         .record(&MetricRequest::counter("orders", 1.0).with_label("status", "paid"))
//!         .await?;
//!
//!     let family = get_metric_family_samples(&registry, "orders", &LookupConfig::default()).await?;
//!     assert_that(&family)
//!         .has_sample_size(1)
//!         .has_sample_label_names(&["status"])
//!         .has_type_of_counter()
//!         .has_sample_value(&["paid"], 1.0);
//!
//!     let missing = get_metric_family_samples(&registry, "order", &LookupConfig::default()).await;
//!     assert!(missing
//!         .unwrap_err()
//!         .to_string()
//!         .contains("closest names are [orders]"));
//!     # Ok::<(), tyl_metrics_assert::TylError>(())
//! })
//! .unwrap();
//! ```
//!
//! ## Custom Sources
//!
//! Anything implementing [`MetricsSource`] can be queried, including a fixed
//! `Vec<MetricFamilySamples>` built by hand.

// Re-export TYL framework functionality
pub use tyl_config::{ConfigManager, ConfigPlugin};
pub use tyl_errors::{TylError, TylResult};
pub use tyl_logging::Environment;

// Snapshot source port
mod source;
pub use source::MetricsSource;

// Domain types
mod types;
pub use types::{
    Labels, MetricDefinition, MetricFamilySamples, MetricRequest, MetricType, RequestKind, Sample,
    DEFAULT_BUCKETS,
};

// Error helpers for metrics domain
mod errors;
pub use errors::{
    from_serde_json_error, metric_not_found_error, metrics_config_error, metrics_error,
    metrics_recording_error, metrics_registration_error, metrics_serialization_error,
    MetricsErrorExt,
};

// Closest-match ranking
mod similarity;
pub use similarity::{levenshtein_distance, top_similar};

// Validation and formatting
mod utils;
pub use utils::{
    double_to_go_string, format_label_pairs, format_labels, format_samples, validate_counter_value,
    validate_label_name, validate_label_names, validate_label_value, validate_labels,
    validate_metric_name, validate_metric_value, values_equal,
};

mod registry;
pub use registry::{InMemoryRegistry, RegistryConfig};

mod lookup;
pub use lookup::{
    default_registry, find_metric_family_samples, get_default_metric_family_samples,
    get_metric_family_samples, install_default_registry, LookupConfig, DEFAULT_MAX_SUGGESTIONS,
};

mod matchers;
pub use matchers::{close_to, satisfies, within_percentage, CloseTo, Satisfies, ValueMatcher, WithinPercentage};

mod assertions;
pub use assertions::{
    assert_that, CounterAndGaugeAssert, FamilyAssert, HistogramAssert, InfoAssert,
    MetricFamilySamplesAssert, SumAndCountAssert, SummaryAssert, TypedAssert,
};

/// Result type for metrics operations using TYL error handling
pub type Result<T> = TylResult<T>;

/// Re-export async_trait for source implementations
pub use async_trait::async_trait;

/// Everything a test needs for lookups and assertion chains
pub mod prelude {
    pub use crate::{
        assert_that, close_to, get_metric_family_samples, satisfies, within_percentage,
        FamilyAssert, InMemoryRegistry, LookupConfig, MetricDefinition, MetricFamilySamples,
        MetricRequest, MetricType, MetricsSource, RegistryConfig, SumAndCountAssert,
        ValueMatcher,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::*;

    #[tokio::test]
    async fn test_record_lookup_and_assert() {
        let registry = InMemoryRegistry::new(RegistryConfig::new("lib"));
        registry
            .register(
                MetricDefinition::histogram("request_seconds")
                    .with_label_names(["method"])
                    .with_buckets([0.1, 1.0]),
            )
            .await
            .unwrap();
        for value in [0.05, 0.5, 2.0] {
            registry
                .record(&MetricRequest::observe("request_seconds", value).with_label("method", "GET"))
                .await
                .unwrap();
        }

        let family = get_metric_family_samples(&registry, "request_seconds", &LookupConfig::default())
            .await
            .unwrap();
        assert_that(&family)
            .has_sample_size(5)
            .has_type_of_histogram()
            .has_bucket_value(&["GET"], 0.1, 1.0)
            .has_bucket_value(&["GET"], 1.0, 2.0)
            .has_bucket_value(&["GET"], f64::INFINITY, 3.0)
            .has_sample_count_value(&["GET"], 3.0)
            .has_sample_sum_value(&["GET"], close_to(2.55, 1e-9));
    }

    #[tokio::test]
    async fn test_lookup_suggests_registered_names() {
        let registry = InMemoryRegistry::default();
        for name in ["cache_hits", "cache_misses", "queue_depth"] {
            registry.register(MetricDefinition::gauge(name)).await.unwrap();
        }

        let error = get_metric_family_samples(&registry, "cache_hit", &LookupConfig::default())
            .await
            .unwrap_err();
        assert!(error
            .to_string()
            .contains("No MetricFamilySamples found by name cache_hit, closest names are [cache_hits,"));
    }

    #[test]
    fn test_tyl_error_integration() {
        let error = metrics_error("metric_name", "Invalid metric name");
        assert!(error.to_string().contains("Invalid metric name"));
    }

    #[test]
    fn test_snapshot_json_round_trip_keeps_assertions() {
        let families = vec![MetricFamilySamples::new("up", MetricType::Gauge, "")
            .with_sample(Sample::new("up", &[], &[], 1.0))];
        let json = MetricFamilySamples::to_json(&families).unwrap();
        let restored = MetricFamilySamples::from_json(&json).unwrap();

        let up = find_metric_family_samples(&restored, "up", &LookupConfig::default()).unwrap();
        assert_that(up).has_type_of_gauge().has_sample_value(&[], 1.0);
    }
}
