//! Build pipeline kinds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::model::ResourceSpec;

/// Build template attached to an AssemblyFactory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub meta_data: BTreeMap<String, String>,
    /// run policy, triggers, source and strategy
    pub spec: Map<String, Value>,
}

impl ResourceSpec for BuildConfig {}

/// One execution of a BuildConfig.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Build {
    pub spec: Map<String, Value>,
}

impl ResourceSpec for Build {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageReferenceSpec {
    pub lookup_policy: bool,
    pub map_marks: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageReference {
    pub spec: ImageReferenceSpec,
}

impl ResourceSpec for ImageReference {}

/// Image produced by a Build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageMarks {
    pub lookup_policy: bool,
    pub generation: u64,
    pub image: Map<String, Value>,
}

impl ResourceSpec for ImageMarks {}
