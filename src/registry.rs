//! In-memory metrics registry
//!
//! A small instrumentation client that keeps metric families in memory and
//! exposes them as Prometheus-shaped snapshots through `MetricsSource`. It is
//! what tests record into before asserting on the collected families.

use super::*;
use crate::errors::{metrics_config_error, metrics_recording_error, metrics_registration_error};
use crate::utils::{
    double_to_go_string, format_labels, validate_counter_value, validate_label_names,
    validate_labels, validate_metric_name, validate_metric_value,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Configuration for the in-memory registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Service name, used in log output
    pub service_name: String,

    /// Whether counters, summaries and histograms also export `_created` samples
    pub emit_created: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            service_name: "test-service".to_string(),
            emit_created: false,
        }
    }
}

impl RegistryConfig {
    /// Create a new config for the given service
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Enable or disable `_created` samples
    pub fn with_created(mut self, emit_created: bool) -> Self {
        self.emit_created = emit_created;
        self
    }

    /// Check the configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(metrics_config_error(
                "service_name",
                "Service name cannot be empty",
            ));
        }
        Ok(())
    }
}

/// Current value of one labelled child of a family
#[derive(Debug, Clone)]
enum ChildValue {
    Scalar(f64),
    Histogram {
        /// Cumulative counts, one per configured bucket (without `+Inf`)
        buckets: Vec<u64>,
        count: u64,
        sum: f64,
    },
    Summary {
        observations: Vec<f64>,
        sum: f64,
    },
    Info,
}

#[derive(Debug, Clone)]
struct Child {
    label_values: Vec<String>,
    value: ChildValue,
    created: f64,
}

#[derive(Debug, Clone)]
struct FamilyState {
    definition: MetricDefinition,
    /// Histogram bucket bounds without a trailing `+Inf`, which is always implicit
    bounds: Vec<f64>,
    children: Vec<Child>,
}

impl FamilyState {
    fn new(definition: MetricDefinition) -> Self {
        let mut bounds = definition.buckets().to_vec();
        if bounds.last() == Some(&f64::INFINITY) {
            bounds.pop();
        }
        let mut state = Self {
            definition,
            bounds,
            children: Vec::new(),
        };
        // Unlabelled families export their zero child right away
        if state.definition.label_names().is_empty()
            && state.definition.metric_type() != MetricType::Info
        {
            let child = state.new_child(Vec::new());
            state.children.push(child);
        }
        state
    }

    fn new_child(&self, label_values: Vec<String>) -> Child {
        let value = match self.definition.metric_type() {
            MetricType::Histogram => ChildValue::Histogram {
                buckets: vec![0; self.bounds.len()],
                count: 0,
                sum: 0.0,
            },
            MetricType::Summary => ChildValue::Summary {
                observations: Vec::new(),
                sum: 0.0,
            },
            MetricType::Info => ChildValue::Info,
            _ => ChildValue::Scalar(0.0),
        };
        Child {
            label_values,
            value,
            created: unix_seconds(),
        }
    }

    fn child_mut(&mut self, label_values: Vec<String>) -> &mut Child {
        let index = match self
            .children
            .iter()
            .position(|c| c.label_values == label_values)
        {
            Some(index) => index,
            None => {
                let child = self.new_child(label_values);
                self.children.push(child);
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn apply(&mut self, request: &MetricRequest, label_values: Vec<String>) -> Result<()> {
        let name = self.definition.name().to_string();
        let metric_type = self.definition.metric_type();

        match (request.kind(), metric_type) {
            (RequestKind::Info, MetricType::Info) => {
                let child = self.new_child(label_values);
                self.children = vec![child];
            }
            (RequestKind::Increment(amount), MetricType::Counter) => {
                validate_counter_value(amount)?;
                if let ChildValue::Scalar(value) = &mut self.child_mut(label_values).value {
                    *value += amount;
                }
            }
            (RequestKind::Set(new_value), MetricType::Gauge) => {
                validate_metric_value(new_value)?;
                if let ChildValue::Scalar(value) = &mut self.child_mut(label_values).value {
                    *value = new_value;
                }
            }
            (RequestKind::Observe(observed), MetricType::Histogram) => {
                validate_metric_value(observed)?;
                let bounds = self.bounds.clone();
                if let ChildValue::Histogram {
                    buckets,
                    count,
                    sum,
                } = &mut self.child_mut(label_values).value
                {
                    for (bucket, bound) in buckets.iter_mut().zip(&bounds) {
                        if observed <= *bound {
                            *bucket += 1;
                        }
                    }
                    *count += 1;
                    *sum += observed;
                }
            }
            (RequestKind::Observe(observed), MetricType::Summary) => {
                validate_metric_value(observed)?;
                if let ChildValue::Summary { observations, sum } =
                    &mut self.child_mut(label_values).value
                {
                    observations.push(observed);
                    *sum += observed;
                }
            }
            (kind, _) => {
                return Err(metrics_recording_error(
                    name,
                    format!("{kind:?} cannot be applied to a {metric_type} family"),
                ));
            }
        }

        Ok(())
    }

    fn snapshot(&self, emit_created: bool) -> MetricFamilySamples {
        let definition = &self.definition;
        let name = definition.name();
        let mut family =
            MetricFamilySamples::new(name, definition.metric_type(), definition.help());

        for child in &self.children {
            let names = definition.label_names().to_vec();
            let values = child.label_values.clone();

            match &child.value {
                ChildValue::Scalar(value) => {
                    family
                        .samples
                        .push(Sample::from_parts(name, names.clone(), values.clone(), *value));
                    if emit_created && definition.metric_type() == MetricType::Counter {
                        family.samples.push(Sample::from_parts(
                            format!("{name}_created"),
                            names,
                            values,
                            child.created,
                        ));
                    }
                }
                ChildValue::Histogram {
                    buckets,
                    count,
                    sum,
                } => {
                    let bounds = self.bounds.iter().copied().chain([f64::INFINITY]);
                    let counts = buckets.iter().copied().chain([*count]);
                    for (bound, cumulative) in bounds.zip(counts) {
                        family.samples.push(Sample::from_parts(
                            format!("{name}_bucket"),
                            with_extra(&names, "le"),
                            with_extra(&values, &double_to_go_string(bound)),
                            cumulative as f64,
                        ));
                    }
                    push_sum_and_count(
                        &mut family,
                        &names,
                        &values,
                        *count as f64,
                        *sum,
                        emit_created.then_some(child.created),
                    );
                }
                ChildValue::Summary { observations, sum } => {
                    for quantile in definition.quantiles() {
                        family.samples.push(Sample::from_parts(
                            name,
                            with_extra(&names, "quantile"),
                            with_extra(&values, &double_to_go_string(*quantile)),
                            nearest_rank(observations, *quantile),
                        ));
                    }
                    push_sum_and_count(
                        &mut family,
                        &names,
                        &values,
                        observations.len() as f64,
                        *sum,
                        emit_created.then_some(child.created),
                    );
                }
                ChildValue::Info => {
                    family
                        .samples
                        .push(Sample::from_parts(format!("{name}_info"), names, values, 1.0));
                }
            }
        }

        family
    }
}

fn with_extra(items: &[String], extra: &str) -> Vec<String> {
    let mut extended = Vec::with_capacity(items.len() + 1);
    extended.extend_from_slice(items);
    extended.push(extra.to_string());
    extended
}

fn push_sum_and_count(
    family: &mut MetricFamilySamples,
    names: &[String],
    values: &[String],
    count: f64,
    sum: f64,
    created: Option<f64>,
) {
    let name = family.name.clone();
    let mut push = |suffix: &str, value: f64| {
        family.samples.push(Sample::from_parts(
            format!("{name}_{suffix}"),
            names.to_vec(),
            values.to_vec(),
            value,
        ));
    };
    push("count", count);
    push("sum", sum);
    if let Some(created) = created {
        push("created", created);
    }
}

/// Nearest-rank quantile; NaN without observations
fn nearest_rank(observations: &[f64], quantile: f64) -> f64 {
    if observations.is_empty() {
        return f64::NAN;
    }
    let mut sorted = observations.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (quantile * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

fn unix_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

fn validate_definition(definition: &MetricDefinition) -> Result<()> {
    let name = definition.name();
    validate_metric_name(name)?;
    validate_label_names(definition.label_names())?;

    match definition.metric_type() {
        MetricType::Histogram => {
            if definition.label_names().iter().any(|n| n == "le") {
                return Err(metrics_registration_error(
                    name,
                    "Histograms cannot have a label named 'le'",
                ));
            }
            let buckets = definition.buckets();
            if buckets.iter().any(|b| b.is_nan()) {
                return Err(metrics_registration_error(name, "Bucket bounds cannot be NaN"));
            }
            if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(metrics_registration_error(
                    name,
                    "Histogram buckets must be in strictly increasing order",
                ));
            }
        }
        MetricType::Summary => {
            if definition.label_names().iter().any(|n| n == "quantile") {
                return Err(metrics_registration_error(
                    name,
                    "Summaries cannot have a label named 'quantile'",
                ));
            }
            if definition
                .quantiles()
                .iter()
                .any(|q| !(0.0..=1.0).contains(q))
            {
                return Err(metrics_registration_error(
                    name,
                    "Quantiles must be between 0.0 and 1.0",
                ));
            }
        }
        MetricType::Counter | MetricType::Gauge | MetricType::Info => {}
        other => {
            return Err(metrics_registration_error(
                name,
                format!("{other} families cannot be registered"),
            ));
        }
    }

    Ok(())
}

/// In-memory registry of metric families
///
/// ## Features
/// - Counter, gauge, histogram, summary and info families
/// - Labelled children created on first recording, in recording order
/// - Thread-safe concurrent access, cheap to clone
///
/// ## Example Usage
/// ```rust
/// use tyl_metrics_assert::{
///     assert_that, FamilyAssert, InMemoryRegistry, MetricDefinition, MetricRequest,
///     MetricsSource, RegistryConfig,
/// };
///
/// # tokio_test::block_on(async {
/// let registry = InMemoryRegistry::new(RegistryConfig::new("docs"));
/// registry
///     .register(MetricDefinition::counter("jobs_total").with_label_names(["queue"]))
///     .await
///     .unwrap();
/// registry
///     .record(&MetricRequest::counter("jobs_total", 2.0).with_label("queue", "mail"))
///     .await
///     .unwrap();
///
/// let families = registry.collect().await.unwrap();
/// assert_that(&families[0])
///     .has_type_of_counter()
///     .has_sample_value(&["mail"], 2.0);
/// # });
/// ```
#[derive(Clone)]
pub struct InMemoryRegistry {
    config: RegistryConfig,
    families: Arc<RwLock<Vec<FamilyState>>>,
}

impl InMemoryRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            families: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a registry after validating its configuration
    pub fn try_new(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Get current configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a metric family
    ///
    /// Fails if the definition is invalid or a family with the same name
    /// already exists.
    pub async fn register(&self, definition: MetricDefinition) -> Result<()> {
        validate_definition(&definition)?;

        let mut families = self.families.write().await;
        if families
            .iter()
            .any(|f| f.definition.name() == definition.name())
        {
            return Err(metrics_registration_error(
                definition.name(),
                "A family with this name is already registered",
            ));
        }

        debug!(
            "[{}] registered {} family {}",
            self.config.service_name,
            definition.metric_type(),
            definition.name()
        );
        families.push(FamilyState::new(definition));
        Ok(())
    }

    /// Remove a family, returning whether it existed
    pub async fn unregister(&self, name: &str) -> bool {
        let mut families = self.families.write().await;
        let before = families.len();
        families.retain(|f| f.definition.name() != name);
        families.len() != before
    }

    /// Remove all families
    pub async fn clear(&self) {
        self.families.write().await.clear();
    }

    /// Number of registered families
    pub async fn family_count(&self) -> usize {
        self.families.read().await.len()
    }

    /// Apply a request to its registered family
    ///
    /// The request labels must match the family's label names exactly.
    pub async fn record(&self, request: &MetricRequest) -> Result<()> {
        validate_labels(request.labels())?;

        let mut families = self.families.write().await;
        let family = families
            .iter_mut()
            .find(|f| f.definition.name() == request.name())
            .ok_or_else(|| {
                metrics_recording_error(request.name(), "Family is not registered")
            })?;

        let label_names = family.definition.label_names();
        if label_names.len() != request.labels().len()
            || label_names
                .iter()
                .any(|n| !request.labels().contains_key(n))
        {
            return Err(metrics_recording_error(
                request.name(),
                format!(
                    "Expected labels [{}] but got {}",
                    label_names.join(", "),
                    format_labels(request.labels())
                ),
            ));
        }
        let label_values = label_names
            .iter()
            .map(|n| request.labels()[n].clone())
            .collect();

        debug!(
            "[{}] recording {:?} for {}{{{}}}",
            self.config.service_name,
            request.kind(),
            request.name(),
            format_labels(request.labels())
        );
        family.apply(request, label_values)
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[async_trait::async_trait]
impl MetricsSource for InMemoryRegistry {
    async fn collect(&self) -> Result<Vec<MetricFamilySamples>> {
        let families = self.families.read().await;
        Ok(families
            .iter()
            .map(|f| f.snapshot(self.config.emit_created))
            .collect())
    }

    async fn family_names(&self) -> Result<Vec<String>> {
        Ok(self
            .families
            .read()
            .await
            .iter()
            .map(|f| f.definition.name().to_string())
            .collect())
    }
}
