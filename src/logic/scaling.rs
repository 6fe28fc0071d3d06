use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::logic::assembler::ReplicaNamer;
use crate::model::{HorizontalScaling, Object, Resource, ResourceId, VerticalScaling};

/// What a horizontal scaler would do to its factory right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingPlan {
    pub factory_id: ResourceId,
    pub current_replicas: u32,
    pub desired_replicas: u32,
    /// Names of the replicas to add.
    pub to_deploy: Vec<String>,
    /// Ids of the newest replicas to remove.
    pub to_retire: Vec<ResourceId>,
}

impl ScalingPlan {
    /// `assemblies` are the live replicas of the factory in creation order.
    pub fn compute(
        policy: &Object<HorizontalScaling>,
        factory: &Resource,
        assemblies: &[Resource],
    ) -> Self {
        let spec = &policy.body.spec;
        let current = assemblies.len() as u32;
        let requested = policy
            .envelope
            .status
            .detail::<u32>("desired_replicas")
            .unwrap_or(current);
        let desired = requested.max(spec.min_replicas).min(spec.max_replicas);

        let namer = ReplicaNamer::new(&factory.object_meta().name);
        let to_deploy = if desired > current {
            namer.names(current + 1, desired, desired)
        } else {
            Vec::new()
        };
        let to_retire = assemblies
            .iter()
            .rev()
            .take(current.saturating_sub(desired) as usize)
            .map(Resource::id)
            .collect();

        Self {
            factory_id: factory.id(),
            current_replicas: current,
            desired_replicas: desired,
            to_deploy,
            to_retire,
        }
    }
}

/// Answer of a horizontal scale request: the factory itself, with the plan
/// for it under `scaling`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledFactory {
    #[serde(flatten)]
    pub factory: Resource,
    pub scaling: ScalingPlan,
}

/// Observed resource usage of a factory's replicas, averaged per metric.
#[async_trait::async_trait]
pub trait MetricsSource: Send + Sync {
    async fn usage(&self, factory_id: ResourceId) -> Result<BTreeMap<String, f64>>;
}

/// No metrics pipeline attached; every query fails.
#[derive(Debug, Default, Clone)]
pub struct UnavailableMetrics;

#[async_trait::async_trait]
impl MetricsSource for UnavailableMetrics {
    async fn usage(&self, factory_id: ResourceId) -> Result<BTreeMap<String, f64>> {
        Err(anyhow!("no metrics source available for factory {}", factory_id))
    }
}

/// Fixed readings, for wiring tests and demos.
#[derive(Debug, Default, Clone)]
pub struct StaticMetrics {
    readings: BTreeMap<String, f64>,
}

impl StaticMetrics {
    pub fn new<I: IntoIterator<Item = (String, f64)>>(readings: I) -> Self {
        Self {
            readings: readings.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl MetricsSource for StaticMetrics {
    async fn usage(&self, _factory_id: ResourceId) -> Result<BTreeMap<String, f64>> {
        Ok(self.readings.clone())
    }
}

/// Per metric resource sizing suggested by a vertical scaler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceRecommendation {
    pub factory_id: ResourceId,
    pub current_resource: BTreeMap<String, String>,
    pub desired_resource: BTreeMap<String, String>,
}

impl ResourceRecommendation {
    /// Clamp each observed reading into the policy's `[min_resource, max_resource]`.
    /// Bounds keep their unit suffix (`"1000 MiB"`); readings without a bound
    /// pass through unchanged.
    pub fn compute(
        policy: &Object<VerticalScaling>,
        factory_id: ResourceId,
        usage: &BTreeMap<String, f64>,
    ) -> Self {
        let spec = &policy.body.spec;
        let mut current_resource = BTreeMap::new();
        let mut desired_resource = BTreeMap::new();

        for (metric, reading) in usage {
            let min = spec.min_resource.get(metric).and_then(|v| Quantity::parse(v));
            let max = spec.max_resource.get(metric).and_then(|v| Quantity::parse(v));
            let unit = max
                .as_ref()
                .or(min.as_ref())
                .map(|q| q.unit.clone())
                .unwrap_or_default();

            let mut desired = *reading;
            if let Some(min) = &min {
                desired = desired.max(min.value);
            }
            if let Some(max) = &max {
                desired = desired.min(max.value);
            }

            current_resource.insert(metric.clone(), Quantity::render(*reading, &unit));
            desired_resource.insert(metric.clone(), Quantity::render(desired, &unit));
        }

        Self {
            factory_id,
            current_resource,
            desired_resource,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Quantity {
    value: f64,
    unit: String,
}

impl Quantity {
    /// `"4"`, `"1000 MiB"`, `"2.5GiB"`
    fn parse(raw: &str) -> Option<Quantity> {
        let raw = raw.trim();
        let split = raw
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(raw.len());
        let (number, unit) = raw.split_at(split);
        let value = number.parse::<f64>().ok()?;
        Some(Quantity {
            value,
            unit: unit.trim().to_string(),
        })
    }

    fn render(value: f64, unit: &str) -> String {
        let number = if value.fract() == 0.0 {
            format!("{}", value as i64)
        } else {
            format!("{:.2}", value)
        };
        if unit.is_empty() {
            number
        } else {
            format!("{} {}", number, unit)
        }
    }
}
