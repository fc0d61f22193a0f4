//! Port interface for metric snapshot sources
//!
//! Assertions never reach into a global registry. Whatever produces metric
//! snapshots (the in-memory registry, a collector under test, a fixture) is
//! handed to the lookup functions as a `MetricsSource`.

use super::*;
use async_trait::async_trait;

/// **Port Interface** for anything that can produce a metric snapshot
///
/// ## Example Implementation
/// ```rust
/// use tyl_metrics_assert::{async_trait, MetricFamilySamples, MetricType, MetricsSource, Result};
///
/// pub struct BuildInfoCollector;
///
/// #[async_trait]
/// impl MetricsSource for BuildInfoCollector {
///     async fn collect(&self) -> Result<Vec<MetricFamilySamples>> {
///         Ok(vec![MetricFamilySamples::new("build", MetricType::Info, "Build information")])
///     }
/// }
/// ```
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Take a snapshot of all metric families currently known to the source
    ///
    /// The returned families are owned copies; later recordings do not change
    /// them, so a snapshot must be taken again after new observations.
    async fn collect(&self) -> Result<Vec<MetricFamilySamples>>;

    /// Names of all families in the current snapshot, in snapshot order
    async fn family_names(&self) -> Result<Vec<String>> {
        Ok(self
            .collect()
            .await?
            .into_iter()
            .map(|family| family.name)
            .collect())
    }
}

/// A fixed snapshot is itself a source
#[async_trait]
impl MetricsSource for Vec<MetricFamilySamples> {
    async fn collect(&self) -> Result<Vec<MetricFamilySamples>> {
        Ok(self.clone())
    }
}

#[async_trait]
impl<T: MetricsSource + ?Sized> MetricsSource for std::sync::Arc<T> {
    async fn collect(&self) -> Result<Vec<MetricFamilySamples>> {
        (**self).collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_vec_source_returns_copy() {
        let families = vec![
            MetricFamilySamples::new("up", MetricType::Gauge, "help"),
            MetricFamilySamples::new("requests", MetricType::Counter, "help"),
        ];

        let collected = families.collect().await.unwrap();
        assert_eq!(collected, families);
    }

    #[tokio::test]
    async fn test_default_family_names() {
        let families = vec![
            MetricFamilySamples::new("up", MetricType::Gauge, "help"),
            MetricFamilySamples::new("requests", MetricType::Counter, "help"),
        ];

        let names = families.family_names().await.unwrap();
        assert_eq!(names, vec!["up", "requests"]);
    }

    #[tokio::test]
    async fn test_arc_source_delegates() {
        let source: std::sync::Arc<dyn MetricsSource> =
            std::sync::Arc::new(vec![MetricFamilySamples::new("up", MetricType::Gauge, "")]);

        let names = source.family_names().await.unwrap();
        assert_eq!(names, vec!["up"]);
    }
}
