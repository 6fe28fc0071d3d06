//! System scoped infrastructure kinds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::model::{FieldReference, ResourceKind, ResourceSpec};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub node_ip: String,
    pub spec: Map<String, Value>,
}

impl ResourceSpec for Node {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.node_ip.is_empty() {
            missing.push("node_ip".to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub network_type: String,
    pub subnet_ip: String,
    pub netmask: String,
    pub gateway: String,
    pub used_bits: Vec<u16>,
    pub bridge_hosts: BTreeMap<String, String>,
}

impl ResourceSpec for Network {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        for (field, value) in [
            ("network_type", &self.network_type),
            ("subnet_ip", &self.subnet_ip),
            ("netmask", &self.netmask),
            ("gateway", &self.gateway),
        ] {
            if value.is_empty() {
                missing.push(field.to_string());
            }
        }
    }
}

/// Groups nodes, networks and one storage connector into a placement target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Datacenter {
    pub nodes: Vec<String>,
    pub networks: Vec<String>,
    pub enabled: bool,
    pub storage: String,
    pub advanced_settings: BTreeMap<String, String>,
    pub flag: String,
    pub currency: String,
}

impl ResourceSpec for Datacenter {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.nodes.is_empty() || self.nodes.iter().any(String::is_empty) {
            missing.push("nodes".to_string());
        }
        if self.networks.is_empty() || self.networks.iter().any(String::is_empty) {
            missing.push("networks".to_string());
        }
        if self.storage.is_empty() {
            missing.push("storage".to_string());
        }
    }

    fn field_references(&self) -> Vec<FieldReference> {
        let nodes = self
            .nodes
            .iter()
            .map(|id| FieldReference::required("nodes", ResourceKind::Node, id));
        let networks = self
            .networks
            .iter()
            .map(|id| FieldReference::required("networks", ResourceKind::Network, id));
        nodes
            .chain(networks)
            .chain(std::iter::once(FieldReference::required(
                "storage",
                ResourceKind::StorageConnector,
                &self.storage,
            )))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Disk {
    pub disk: String,
    pub disk_type: String,
    pub point: String,
    pub size: String,
    pub used_size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageInfo {
    pub disks: Vec<Disk>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConnector {
    pub host_ip: String,
    pub storage_type: String,
    pub parameters: BTreeMap<String, String>,
    pub storage_info: StorageInfo,
    pub node_info: Map<String, Value>,
}

impl ResourceSpec for StorageConnector {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.host_ip.is_empty() {
            missing.push("host_ip".to_string());
        }
        if self.storage_type.is_empty() {
            missing.push("storage_type".to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoragePool {
    pub connector_id: String,
    pub parameters: BTreeMap<String, String>,
    pub storage_info: StorageInfo,
}

impl ResourceSpec for StoragePool {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.connector_id.is_empty() {
            missing.push("connector_id".to_string());
        }
    }

    fn field_references(&self) -> Vec<FieldReference> {
        vec![FieldReference::required(
            "connector_id",
            ResourceKind::StorageConnector,
            &self.connector_id,
        )]
    }
}
