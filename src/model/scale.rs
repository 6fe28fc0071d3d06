//! Scaling policies attached to an AssemblyFactory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::model::ResourceSpec;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSpec {
    pub scale_up_by: String,
    pub scale_down_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricResource {
    pub name: String,
    pub min_target_value: String,
    pub max_target_value: String,
    pub metric_time_spec: TimeSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metric {
    /// `Object` or `Resource`
    pub metric_type: String,
    pub object: Map<String, Value>,
    pub resource: MetricResource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizontalScalingSpec {
    pub min_replicas: u32,
    pub max_replicas: u32,
    /// Clients send either seconds or a duration string such as `"5m"`.
    pub scale_up_wait_time: Value,
    pub scale_down_wait_time: Value,
    pub metrics: Vec<Metric>,
}

/// Replica count policy. `MANUALHS` passes the desired count straight
/// through, `AUTOHS` lets the controller move between min and max.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizontalScaling {
    pub scale_type: String,
    pub state: String,
    pub metadata: BTreeMap<String, String>,
    pub spec: HorizontalScalingSpec,
}

impl ResourceSpec for HorizontalScaling {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.scale_type.is_empty() {
            missing.push("scale_type".to_string());
        }
        if self.state.is_empty() {
            missing.push("state".to_string());
        }
        if self.spec.min_replicas > self.spec.max_replicas {
            missing.push("spec.max_replicas".to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePolicy {
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalScalingSpec {
    pub scale_up_wait_time: Value,
    pub scale_down_wait_time: Value,
    pub min_resource: BTreeMap<String, String>,
    pub max_resource: BTreeMap<String, String>,
    pub metrics: Vec<Metric>,
}

/// Per-assembly resource policy bounded by `min_resource`/`max_resource`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalScaling {
    pub scale_type: String,
    pub state: String,
    pub update_policy: UpdatePolicy,
    pub metadata: BTreeMap<String, String>,
    pub spec: VerticalScalingSpec,
}

impl ResourceSpec for VerticalScaling {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.scale_type.is_empty() {
            missing.push("scale_type".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wait_time_accepts_strings_and_numbers() {
        let hs: HorizontalScaling = serde_json::from_value(json!({
            "scale_type": "AUTOHS",
            "state": "ABLETOSCALE",
            "spec": {"scale_up_wait_time": "5m", "scale_down_wait_time": 5, "min_replicas": 4, "max_replicas": 5}
        }))
        .unwrap();
        assert_eq!(hs.spec.scale_up_wait_time, json!("5m"));
        assert_eq!(hs.spec.scale_down_wait_time, json!(5));

        let mut missing = Vec::new();
        hs.missing_fields(&mut missing);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_inverted_replica_range_is_rejected() {
        let hs: HorizontalScaling = serde_json::from_value(json!({
            "scale_type": "AUTOHS",
            "state": "ABLETOSCALE",
            "spec": {"min_replicas": 6, "max_replicas": 5}
        }))
        .unwrap();
        let mut missing = Vec::new();
        hs.missing_fields(&mut missing);
        assert_eq!(missing, vec!["spec.max_replicas"]);
    }

    #[test]
    fn test_blank_state_is_missing() {
        let hs: HorizontalScaling = serde_json::from_value(json!({
            "scale_type": "AUTOHS",
            "state": "",
            "spec": {"min_replicas": 1, "max_replicas": 2}
        }))
        .unwrap();
        let mut missing = Vec::new();
        hs.missing_fields(&mut missing);
        assert_eq!(missing, vec!["state"]);
    }
}
