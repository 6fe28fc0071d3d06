//! Deployment kinds: what gets scheduled and how it is exposed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::model::{FieldReference, ObjectMeta, ResourceKind, ResourceSpec, Status};

pub const COMPUTE_TYPE: &str = "compute_type";
pub const STORAGE_TYPE: &str = "storage_type";

/// A deployed workload instance produced by an [`AssemblyFactory`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assembly {
    pub selector: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub spec: Map<String, Value>,
}

impl ResourceSpec for Assembly {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretReference {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toleration {
    pub key: String,
    pub operator: String,
    pub value: String,
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorySpec {
    pub tolerations: Vec<Toleration>,
    pub node_selector: BTreeMap<String, String>,
    pub affinity: BTreeMap<String, String>,
    pub restart_policy: String,
}

/// Template producing `replicas` Assemblys from a Plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyFactory {
    pub replicas: u32,
    /// cpu, memory, storage, `compute_type` (cpu/gpu), `storage_type` (hdd/ssd)
    pub resources: BTreeMap<String, String>,
    pub secret: SecretReference,
    pub plan: String,
    pub metadata: BTreeMap<String, String>,
    pub spec: FactorySpec,
}

impl ResourceSpec for AssemblyFactory {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        factory_missing_fields(self.replicas, &self.plan, &self.resources, missing);
    }

    fn field_references(&self) -> Vec<FieldReference> {
        factory_references(&self.plan, &self.secret)
    }

    fn replicas(&self) -> Option<u32> {
        Some(self.replicas)
    }
}

/// Higher level grouping that expands into one AssemblyFactory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StacksFactory {
    pub replicas: u32,
    pub resources: BTreeMap<String, String>,
    pub secret: SecretReference,
    pub plan: String,
    pub metadata: BTreeMap<String, String>,
    pub spec: FactorySpec,
}

impl ResourceSpec for StacksFactory {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        factory_missing_fields(self.replicas, &self.plan, &self.resources, missing);
    }

    fn field_references(&self) -> Vec<FieldReference> {
        factory_references(&self.plan, &self.secret)
    }

    fn replicas(&self) -> Option<u32> {
        Some(self.replicas)
    }
}

impl From<&StacksFactory> for AssemblyFactory {
    fn from(stack: &StacksFactory) -> Self {
        AssemblyFactory {
            replicas: stack.replicas,
            resources: stack.resources.clone(),
            secret: stack.secret.clone(),
            plan: stack.plan.clone(),
            metadata: stack.metadata.clone(),
            spec: stack.spec.clone(),
        }
    }
}

fn factory_missing_fields(
    replicas: u32,
    plan: &str,
    resources: &BTreeMap<String, String>,
    missing: &mut Vec<String>,
) {
    if replicas == 0 {
        missing.push("replicas".to_string());
    }
    if plan.is_empty() {
        missing.push("plan".to_string());
    }
    for key in [COMPUTE_TYPE, STORAGE_TYPE] {
        if resources.get(key).map_or(true, |v| v.is_empty()) {
            missing.push(format!("resources.{}", key));
        }
    }
}

fn factory_references(plan: &str, secret: &SecretReference) -> Vec<FieldReference> {
    vec![
        FieldReference::required("plan", ResourceKind::Plan, plan),
        FieldReference::optional("secret.id", ResourceKind::Secret, &secret.id),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanProperties {
    pub object_meta: ObjectMeta,
    pub metadata: BTreeMap<String, String>,
    pub category: String,
    pub version: String,
    pub characteristics: BTreeMap<String, String>,
    pub icon: String,
    pub description: String,
    pub status: Status,
    pub lifecycle: Map<String, Value>,
}

/// Marketplace template describing an image and its characteristics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plan {
    pub meta_data: BTreeMap<String, String>,
    pub plans: Vec<PlanProperties>,
    pub category: String,
    pub version: String,
    pub characteristics: BTreeMap<String, String>,
    pub icon: String,
    pub description: String,
}

impl ResourceSpec for Plan {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.category.is_empty() {
            missing.push("category".to_string());
        }
        if self.version.is_empty() {
            missing.push("version".to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSpec {
    pub service_type: String,
    pub loadbalancer_ip: String,
    pub names: BTreeMap<String, String>,
    pub external_names: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub spec: ServiceSpec,
    pub metadata: BTreeMap<String, String>,
}

impl ResourceSpec for Service {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.spec.service_type.is_empty() {
            missing.push("spec.service_type".to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointAddress {
    pub name: String,
    pub protocol_version: String,
    pub ip: String,
    pub mac_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPort {
    pub name: String,
    pub port: String,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subsets {
    pub addresses: Vec<EndpointAddress>,
    pub unready_addresses: Vec<EndpointAddress>,
    pub ports: Vec<EndpointPort>,
}

impl Subsets {
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.unready_addresses.is_empty() && self.ports.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    pub subsets: Subsets,
}

impl ResourceSpec for Endpoint {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.subsets.is_empty() {
            missing.push("subsets".to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressRule {
    pub host: String,
    pub ingress_rule_value: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressSpec {
    pub rules: Vec<IngressRule>,
    pub tls: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ingress {
    pub spec: IngressSpec,
}

impl ResourceSpec for Ingress {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.spec.rules.is_empty() || self.spec.rules.iter().any(|r| r.host.is_empty()) {
            missing.push("spec.rules.host".to_string());
        }
    }
}

/// Storage mounted into an Assembly, carved from a StoragePool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub mount_path: String,
    pub allocated: String,
    pub setting_map: Map<String, Value>,
    pub source: Map<String, Value>,
}

impl ResourceSpec for Volume {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.mount_path.is_empty() {
            missing.push("mount_path".to_string());
        }
        if self.allocated.is_empty() {
            missing.push("allocated".to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSpec {
    pub node_id: String,
    pub group: String,
    pub action: String,
}

/// Unit of work handed to a node agent (`deploy`, `start`, `stop`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub spec: JobSpec,
}

impl ResourceSpec for Job {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.spec.group.is_empty() {
            missing.push("spec.group".to_string());
        }
        if self.spec.action.is_empty() {
            missing.push("spec.action".to_string());
        }
    }

    fn field_references(&self) -> Vec<FieldReference> {
        vec![FieldReference::optional(
            "spec.node_id",
            ResourceKind::Node,
            &self.spec.node_id,
        )]
    }
}
