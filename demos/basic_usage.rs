//! Basic usage example for TYL Metrics Assert
//!
//! Records a few metrics into the in-memory registry, looks families up by
//! name and runs assertion chains over the snapshots. The last step shows the
//! closest-name suggestions of a failed lookup.

use std::sync::Arc;
use tyl_metrics_assert::{
    assert_that, close_to, get_default_metric_family_samples, install_default_registry,
    satisfies, top_similar, FamilyAssert, InMemoryRegistry, MetricDefinition, MetricRequest,
    MetricType, MetricsSource, RegistryConfig, SumAndCountAssert, TypedAssert,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 TYL Metrics Assert - Basic Usage Example");
    println!("============================================");

    let registry = Arc::new(InMemoryRegistry::new(
        RegistryConfig::new("basic-usage-example").with_created(true),
    ));
    install_default_registry(registry.clone())?;

    registry
        .register(
            MetricDefinition::counter("http_requests_total")
                .with_help("Handled HTTP requests")
                .with_label_names(["method", "status"]),
        )
        .await?;
    registry
        .register(MetricDefinition::gauge("active_connections"))
        .await?;
    registry
        .register(
            MetricDefinition::histogram("request_duration_ms")
                .with_buckets([25.0, 50.0, 100.0]),
        )
        .await?;
    registry
        .register(MetricDefinition::summary("payload_bytes").with_quantiles([0.5, 0.9]))
        .await?;
    registry
        .register(MetricDefinition::info("build").with_label_names(["version", "commit"]))
        .await?;
    println!("✅ Registered {} families", registry.family_count().await);

    // Counters and gauges
    println!("\n📊 Recording counters and gauges...");
    for status in ["200", "200", "404"] {
        registry
            .record(
                &MetricRequest::counter("http_requests_total", 1.0)
                    .with_label("method", "GET")
                    .with_label("status", status),
            )
            .await?;
    }
    registry
        .record(&MetricRequest::gauge("active_connections", 42.0))
        .await?;

    // Distributions
    println!("📈 Recording histogram and summary observations...");
    for duration_ms in [12.0, 45.0, 23.0, 67.0, 34.0, 89.0, 150.0] {
        registry
            .record(&MetricRequest::observe("request_duration_ms", duration_ms))
            .await?;
    }
    for size in [512.0, 1024.0, 2048.0, 4096.0] {
        registry
            .record(&MetricRequest::observe("payload_bytes", size))
            .await?;
    }

    registry
        .record(
            &MetricRequest::info("build")
                .with_label("version", "0.1.0")
                .with_label("commit", "abc123"),
        )
        .await?;

    // Assertions over snapshots
    println!("\n🔍 Asserting on snapshots...");
    let requests = get_default_metric_family_samples("http_requests_total").await?;
    assert_that(&requests)
        .has_sample_label_names(&["status", "method"])
        .has_type_of_counter()
        .has_sample_value(&["GET", "200"], 2.0)
        .has_sample_value(&["GET", "404"], 1.0);
    println!("✅ http_requests_total: {} samples", requests.samples.len());

    let durations = get_default_metric_family_samples("request_duration_ms").await?;
    assert_that(&durations)
        .has_type_of_histogram()
        .has_bucket_value(&[], 25.0, 2.0)
        .has_bucket_value(&[], 50.0, 4.0)
        .has_bucket_value(&[], 100.0, 6.0)
        .has_bucket_value(&[], f64::INFINITY, 7.0)
        .has_sample_count_value(&[], 7.0)
        .has_sample_sum_value(&[], close_to(420.0, 0.001))
        .has_sample_created_value(&[], satisfies("a Unix timestamp", |v| v > 0.0));
    println!("✅ request_duration_ms: buckets, count and sum match");

    let payloads = get_default_metric_family_samples("payload_bytes").await?;
    assert_that(&payloads)
        .has_type_of_summary()
        .has_quantile_value(&[], 0.5, 1024.0)
        .has_quantile_value(&[], 0.9, 4096.0)
        .has_sample_count_value(&[], 4.0);
    println!("✅ payload_bytes: quantiles match");

    // Pick the verifier from the family type
    for family in registry.collect().await? {
        let kind = match assert_that(&family).has_any_samples().specialize() {
            TypedAssert::CounterOrGauge(_) => "counter or gauge",
            TypedAssert::Summary(_) => "summary",
            TypedAssert::Histogram(_) => "histogram",
            TypedAssert::Info(info) => {
                info.has_info_labels(&["0.1.0", "abc123"]);
                "info"
            }
        };
        println!("  {:<22} {:<10} {}", family.name, family.metric_type, kind);
    }

    let connections = get_default_metric_family_samples("active_connections").await?;
    assert_that(&connections)
        .has_type(MetricType::Gauge)
        .has_type_of_gauge()
        .has_sample_value(&[], 42.0);

    // Lookup misses
    println!("\n🧭 Looking up a misspelled name...");
    match get_default_metric_family_samples("http_request_total").await {
        Ok(_) => println!("unexpected hit"),
        Err(error) => println!("❌ {error}"),
    }

    let names = registry.family_names().await?;
    println!(
        "💡 Closest to 'payload': {:?}",
        top_similar("payload", &names, 2)
    );

    println!("\n✅ Basic usage demonstration completed!");
    Ok(())
}
