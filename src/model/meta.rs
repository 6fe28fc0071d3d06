use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Phase a freshly admitted resource starts in when the client sent none.
pub const INITIAL_PHASE: &str = "pending";

/// Finalizer stamped on every admitted resource.
pub const ORPHAN_FINALIZER: &str = "orphan";

pub const DEFAULT_GRACE_PERIOD_SECONDS: u32 = 30;

/// Largest replica count one factory may ask for unless configured otherwise.
pub const DEFAULT_MAX_REPLICAS: u32 = 1000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeMeta {
    pub kind: String,
    pub api_version: String,
}

impl TypeMeta {
    pub fn new(kind: &str, api_version: &str) -> Self {
        Self {
            kind: kind.to_string(),
            api_version: api_version.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectMeta {
    pub name: String,
    pub account: String,
    pub cluster_name: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub owner_references: Vec<OwnerReference>,
    pub created_at: String,
    pub deleted_at: String,
    pub deletion_grace_period_seconds: u32,
    pub finalizers: Vec<String>,
    pub initializers: Initializers,
}

/// Back link from a child to the resource that owns it.
///
/// Only `uid` is authoritative. `kind` narrows the lookup when present and is
/// filled in by the resolver when the client left it empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerReference {
    pub kind: String,
    pub api_version: String,
    pub name: String,
    pub uid: String,
    pub block_owner_deletion: bool,
}

impl OwnerReference {
    /// Clients often send a template reference with every field blank.
    pub fn is_placeholder(&self) -> bool {
        self.kind.is_empty() && self.name.is_empty() && self.uid.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectReference {
    pub kind: String,
    pub origin: String,
    pub name: String,
    pub uid: String,
    pub api_version: String,
    pub resource_version: String,
    pub field_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Initializers {
    pub pending: Vec<Initializer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Initializer {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub condition_type: String,
    pub status: String,
    pub reason: String,
    pub message: String,
    pub last_transition_time: String,
    pub last_probe_time: String,
    pub last_update_time: String,
}

/// Most recently observed state of a resource.
///
/// Kinds carry extra observations next to the phase (`current_replicas`,
/// `docker_image_repository`, ...). Those are kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StatusRepr")]
pub struct Status {
    pub phase: String,
    pub message: String,
    pub reason: String,
    pub conditions: Vec<Condition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Status {
    pub fn with_phase(phase: &str) -> Self {
        Self {
            phase: phase.to_string(),
            ..Default::default()
        }
    }

    /// Typed view of one of the kind specific observations.
    pub fn detail<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.extra
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusFields {
    phase: String,
    message: String,
    reason: String,
    conditions: Vec<Condition>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Some clients send `"status": "trial"` instead of an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Phase(String),
    Fields(Box<StatusFields>),
    Absent(()),
}

impl From<StatusRepr> for Status {
    fn from(repr: StatusRepr) -> Self {
        match repr {
            StatusRepr::Phase(phase) => Status::with_phase(&phase),
            StatusRepr::Fields(fields) => Status {
                phase: fields.phase,
                message: fields.message,
                reason: fields.reason,
                conditions: fields.conditions,
                extra: fields.extra,
            },
            StatusRepr::Absent(()) => Status::default(),
        }
    }
}

/// Body of `PUT /{collection}/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: StatusPatch,
}

/// Replacement status. `phase` has no default: a body without it is malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusPatch {
    pub phase: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<StatusPatch> for Status {
    fn from(patch: StatusPatch) -> Self {
        Status {
            phase: patch.phase,
            message: patch.message,
            reason: patch.reason,
            conditions: patch.conditions,
            extra: patch.extra,
        }
    }
}
