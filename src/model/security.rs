use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ResourceSpec;

pub const ORIGIN_KEY: &str = "origin";

pub(crate) fn missing_origin(metadata: &BTreeMap<String, String>, missing: &mut Vec<String>) {
    if metadata.get(ORIGIN_KEY).map_or(true, |v| v.is_empty()) {
        missing.push("metadata.origin".to_string());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Secret {
    /// opaque, kubernetes.io/ssh-auth, kubernetes.io/tls, ...
    pub secret_type: String,
    pub data: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, String>,
}

impl ResourceSpec for Secret {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.secret_type.is_empty() {
            missing.push("secret_type".to_string());
        }
        missing_origin(&self.metadata, missing);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsMap {
    pub metadata: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
}

impl ResourceSpec for SettingsMap {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        missing_origin(&self.metadata, missing);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct License {
    pub product: String,
    pub activation_code: String,
    pub expired_at: String,
}

impl ResourceSpec for License {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.product.is_empty() {
            missing.push("product".to_string());
        }
    }
}
