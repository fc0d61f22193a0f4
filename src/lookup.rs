//! Exact-name lookup of metric families
//!
//! A failed lookup reports the closest known names, ranked by edit distance,
//! so a typo in a test shows what was probably meant.

use super::*;
use crate::errors::{metric_not_found_error, metrics_config_error};
use crate::registry::InMemoryRegistry;
use crate::similarity::top_similar;
use log::warn;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of suggested names in lookup errors
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Configuration for family lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// How many closest names a not-found error lists
    pub max_suggestions: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

impl LookupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many suggestions a failed lookup lists
    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self
    }

    /// Check the configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.max_suggestions == 0 {
            return Err(metrics_config_error(
                "max_suggestions",
                "At least one suggestion must be listed",
            ));
        }
        Ok(())
    }
}

/// Find the family called `name` in a snapshot
///
/// # Example
/// ```rust
/// use tyl_metrics_assert::{find_metric_family_samples, LookupConfig, MetricFamilySamples, MetricType};
///
/// let families = vec![
///     MetricFamilySamples::new("http_requests", MetricType::Counter, ""),
///     MetricFamilySamples::new("http_errors", MetricType::Counter, ""),
/// ];
///
/// let found = find_metric_family_samples(&families, "http_errors", &LookupConfig::default()).unwrap();
/// assert_eq!(found.metric_type, MetricType::Counter);
///
/// let error = find_metric_family_samples(&families, "http_request", &LookupConfig::default()).unwrap_err();
/// assert!(error
///     .to_string()
///     .contains("No MetricFamilySamples found by name http_request, closest names are [http_requests, http_errors]"));
/// ```
pub fn find_metric_family_samples<'a>(
    families: &'a [MetricFamilySamples],
    name: &str,
    config: &LookupConfig,
) -> Result<&'a MetricFamilySamples> {
    if let Some(family) = families.iter().find(|family| family.name == name) {
        return Ok(family);
    }

    let known: Vec<&str> = families.iter().map(|family| family.name.as_str()).collect();
    let closest = top_similar(name, &known, config.max_suggestions);
    warn!(
        "No metric family named {} among {} families, closest names are {:?}",
        name,
        known.len(),
        closest
    );
    Err(metric_not_found_error(name, &closest))
}

/// Take a snapshot from `source` and return an owned copy of the family `name`
pub async fn get_metric_family_samples<S>(
    source: &S,
    name: &str,
    config: &LookupConfig,
) -> Result<MetricFamilySamples>
where
    S: MetricsSource + ?Sized,
{
    let families = source.collect().await?;
    find_metric_family_samples(&families, name, config).cloned()
}

static DEFAULT_REGISTRY: OnceCell<Arc<InMemoryRegistry>> = OnceCell::new();

/// Install the process-wide default registry
///
/// Meant to be called once by the test harness or application entry point.
/// Installing a second registry fails; the first one stays in place.
pub fn install_default_registry(registry: Arc<InMemoryRegistry>) -> Result<()> {
    DEFAULT_REGISTRY.set(registry).map_err(|_| {
        metrics_config_error("default_registry", "A default registry is already installed")
    })
}

/// The installed default registry
pub fn default_registry() -> Result<Arc<InMemoryRegistry>> {
    DEFAULT_REGISTRY.get().cloned().ok_or_else(|| {
        metrics_config_error(
            "default_registry",
            "No default registry installed, call install_default_registry first",
        )
    })
}

/// Look `name` up in the default registry with the default [`LookupConfig`]
pub async fn get_default_metric_family_samples(name: &str) -> Result<MetricFamilySamples> {
    let registry = default_registry()?;
    get_metric_family_samples(registry.as_ref(), name, &LookupConfig::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryConfig;

    fn families(names: &[&str]) -> Vec<MetricFamilySamples> {
        names
            .iter()
            .map(|name| MetricFamilySamples::new(*name, MetricType::Counter, ""))
            .collect()
    }

    #[test]
    fn test_lookup_config_defaults() {
        let config = LookupConfig::default();
        assert_eq!(config.max_suggestions, 5);
        assert!(config.validate().is_ok());
        assert!(LookupConfig::new().with_max_suggestions(0).validate().is_err());
    }

    #[test]
    fn test_lookup_config_from_json() {
        let config: LookupConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LookupConfig::default());

        let config: LookupConfig = serde_json::from_str(r#"{"max_suggestions": 2}"#).unwrap();
        assert_eq!(config.max_suggestions, 2);
    }

    #[test]
    fn test_find_exact_name() {
        let snapshot = families(&["foo", "foobar", "afoo"]);
        let found = find_metric_family_samples(&snapshot, "foobar", &LookupConfig::default()).unwrap();
        assert_eq!(found.name, "foobar");
    }

    #[test]
    fn test_not_found_lists_closest_names() {
        let snapshot = families(&["abcfooefg", "foobar", "afoob", "afooba", "afoo"]);

        let error = find_metric_family_samples(&snapshot, "foo", &LookupConfig::default()).unwrap_err();
        assert!(error.to_string().contains(
            "No MetricFamilySamples found by name foo, closest names are [afoo, afoob, foobar, afooba, abcfooefg]"
        ));

        let config = LookupConfig::new().with_max_suggestions(3);
        let error = find_metric_family_samples(&snapshot, "foo", &config).unwrap_err();
        assert!(error
            .to_string()
            .contains("closest names are [afoo, afoob, foobar]"));
    }

    #[test]
    fn test_not_found_in_empty_snapshot() {
        let error = find_metric_family_samples(&[], "foo", &LookupConfig::default()).unwrap_err();
        assert!(error.to_string().contains("closest names are []"));
    }

    #[tokio::test]
    async fn test_get_from_registry() {
        let registry = InMemoryRegistry::new(RegistryConfig::new("lookup"));
        registry
            .register(MetricDefinition::counter("http_requests"))
            .await
            .unwrap();
        registry
            .record(&MetricRequest::counter("http_requests", 3.0))
            .await
            .unwrap();

        let family = get_metric_family_samples(&registry, "http_requests", &LookupConfig::default())
            .await
            .unwrap();
        assert_eq!(family.samples[0].value, 3.0);

        let error = get_metric_family_samples(&registry, "http_request", &LookupConfig::default())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("closest names are [http_requests]"));
    }

    #[tokio::test]
    async fn test_get_from_dyn_source() {
        let source: Arc<dyn MetricsSource> = Arc::new(families(&["up"]));
        let family = get_metric_family_samples(source.as_ref(), "up", &LookupConfig::default())
            .await
            .unwrap();
        assert_eq!(family.name, "up");
    }

    // The default registry is process-wide, so its whole lifecycle lives in one test
    #[tokio::test]
    async fn test_default_registry_lifecycle() {
        assert!(default_registry().is_err());
        assert!(get_default_metric_family_samples("jobs").await.is_err());

        let registry = Arc::new(InMemoryRegistry::new(RegistryConfig::new("default")));
        registry.register(MetricDefinition::gauge("jobs")).await.unwrap();
        install_default_registry(registry.clone()).unwrap();

        let second = Arc::new(InMemoryRegistry::default());
        assert!(install_default_registry(second).is_err());

        registry.record(&MetricRequest::gauge("jobs", 7.0)).await.unwrap();
        let family = get_default_metric_family_samples("jobs").await.unwrap();
        assert_eq!(family.samples[0].value, 7.0);
        assert!(Arc::ptr_eq(&default_registry().unwrap(), &registry));
    }
}
