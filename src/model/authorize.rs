//! Tenancy and access control kinds.
//!
//! These kinds also accept a top level `name`, which stands in for
//! `object_meta.name` when the latter is blank.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::security::missing_origin;
use crate::model::{FieldReference, ResourceKind, ResourceSpec};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    pub name: String,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
}

impl ResourceSpec for Team {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        missing_origin(&self.metadata, missing);
    }

    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Origin {
    pub name: String,
}

impl ResourceSpec for Origin {
    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub name: String,
    pub description: String,
}

impl ResourceSpec for Role {
    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permission {
    pub role_id: String,
    pub name: String,
    pub description: String,
}

impl ResourceSpec for Permission {
    fn missing_fields(&self, missing: &mut Vec<String>) {
        if self.role_id.is_empty() {
            missing.push("role_id".to_string());
        }
    }

    fn field_references(&self) -> Vec<FieldReference> {
        vec![FieldReference::required(
            "role_id",
            ResourceKind::Role,
            &self.role_id,
        )]
    }

    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
