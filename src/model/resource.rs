use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::model::{
    Assembly, AssemblyFactory, Build, BuildConfig, Datacenter, Endpoint, HorizontalScaling,
    ImageMarks, ImageReference, Ingress, Job, License, Network, Node, ObjectMeta, Origin,
    Permission, Plan, ResourceId, ResourceKind, Role, Secret, Service, SettingsMap,
    StacksFactory, Status, StorageConnector, StoragePool, TypeMeta, VerticalScaling, Volume,
    Team,
};

/// A parent referenced through a typed body field (`plan`, `role_id`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReference {
    /// Dotted path reported back to the client on failure.
    pub field: &'static str,
    pub kind: ResourceKind,
    pub uid: String,
    /// Optional references are skipped when blank.
    pub required: bool,
}

impl FieldReference {
    pub fn required(field: &'static str, kind: ResourceKind, uid: &str) -> Self {
        Self {
            field,
            kind,
            uid: uid.to_string(),
            required: true,
        }
    }

    pub fn optional(field: &'static str, kind: ResourceKind, uid: &str) -> Self {
        Self {
            field,
            kind,
            uid: uid.to_string(),
            required: false,
        }
    }
}

/// Kind specific behaviour of a resource body.
pub trait ResourceSpec: fmt::Debug + Send + Sync {
    /// Push the dotted path of every required body field that is blank.
    fn missing_fields(&self, _missing: &mut Vec<String>) {}

    fn field_references(&self) -> Vec<FieldReference> {
        Vec::new()
    }

    /// Top level `name` some kinds accept in place of `object_meta.name`.
    fn display_name(&self) -> Option<&str> {
        None
    }

    /// Assemblies a factory kind expands into.
    fn replicas(&self) -> Option<u32> {
        None
    }
}

/// Fields every kind shares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub id: ResourceId,
    pub type_meta: TypeMeta,
    pub object_meta: ObjectMeta,
    pub status: Status,
}

/// A stored resource: the shared envelope with the kind's body inlined next to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Object<B> {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub body: B,
}

impl<B> Object<B> {
    pub fn new(envelope: Envelope, body: B) -> Self {
        Self { envelope, body }
    }
}

macro_rules! resources {
    ($($kind:ident),* $(,)?) => {
        /// One variant per [`ResourceKind`], each carrying its typed body.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum Resource {
            $($kind(Object<$kind>),)*
        }

        impl Resource {
            /// Decode a payload as the given kind.
            pub fn from_value(kind: ResourceKind, value: Value) -> serde_json::Result<Resource> {
                match kind {
                    $(ResourceKind::$kind => serde_json::from_value(value).map(Resource::$kind),)*
                }
            }

            pub fn kind(&self) -> ResourceKind {
                match self {
                    $(Resource::$kind(_) => ResourceKind::$kind,)*
                }
            }

            pub fn envelope(&self) -> &Envelope {
                match self {
                    $(Resource::$kind(object) => &object.envelope,)*
                }
            }

            pub fn envelope_mut(&mut self) -> &mut Envelope {
                match self {
                    $(Resource::$kind(object) => &mut object.envelope,)*
                }
            }

            pub fn spec(&self) -> &dyn ResourceSpec {
                match self {
                    $(Resource::$kind(object) => &object.body,)*
                }
            }

            /// Swap in the body of `other`. False when the kinds differ.
            pub fn replace_body(&mut self, other: Resource) -> bool {
                match (self, other) {
                    $((Resource::$kind(current), Resource::$kind(incoming)) => {
                        current.body = incoming.body;
                        true
                    })*
                    _ => false,
                }
            }
        }
    };
}

resources!(
    Assembly,
    AssemblyFactory,
    StacksFactory,
    Plan,
    BuildConfig,
    Build,
    ImageReference,
    ImageMarks,
    Node,
    Volume,
    Job,
    Secret,
    Service,
    Endpoint,
    Ingress,
    HorizontalScaling,
    VerticalScaling,
    Team,
    Origin,
    Role,
    Permission,
    StoragePool,
    StorageConnector,
    Network,
    Datacenter,
    License,
    SettingsMap,
);

impl Resource {
    pub fn from_slice(kind: ResourceKind, bytes: &[u8]) -> serde_json::Result<Resource> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(kind, value)
    }

    pub fn id(&self) -> ResourceId {
        self.envelope().id
    }

    pub fn object_meta(&self) -> &ObjectMeta {
        &self.envelope().object_meta
    }

    pub fn status(&self) -> &Status {
        &self.envelope().status
    }

    pub fn account(&self) -> &str {
        &self.object_meta().account
    }

    /// Ids of every resource this one points at, through owner references or
    /// typed fields. Used to answer list-by-parent queries.
    pub fn parent_ids(&self) -> Vec<ResourceId> {
        let owners = self
            .object_meta()
            .owner_references
            .iter()
            .map(|owner| owner.uid.clone());
        let fields = self
            .spec()
            .field_references()
            .into_iter()
            .map(|reference| reference.uid);

        owners
            .chain(fields)
            .filter_map(|uid| ResourceId::parse(&uid).ok().flatten())
            .sorted()
            .dedup()
            .collect()
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// `{kind: "<Kind>List", api_version, items}` returned by every listing.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceList {
    pub kind: String,
    pub api_version: String,
    pub items: Vec<Resource>,
}

impl ResourceList {
    pub fn new(kind: ResourceKind, api_version: &str, items: Vec<Resource>) -> Self {
        Self {
            kind: kind.list_kind(),
            api_version: api_version.to_string(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OwnerReference;
    use serde_json::json;

    #[test]
    fn test_body_fields_sit_next_to_the_envelope() {
        let resource = Resource::from_value(
            ResourceKind::Volume,
            json!({
                "id": "12",
                "object_meta": {"name": "vol", "account": "98"},
                "mount_path": "/var/lib/path",
                "allocated": "50 GiB"
            }),
        )
        .unwrap();

        assert_eq!(resource.kind(), ResourceKind::Volume);
        assert_eq!(resource.id(), ResourceId::new(12));

        let value = resource.to_value().unwrap();
        assert_eq!(value["mount_path"], json!("/var/lib/path"));
        assert_eq!(value["object_meta"]["name"], json!("vol"));
        assert_eq!(value["id"], json!("12"));
        assert!(value.get("envelope").is_none());
        assert!(value.get("body").is_none());
    }

    #[test]
    fn test_wrong_field_type_is_a_decode_error() {
        let decoded = Resource::from_value(
            ResourceKind::AssemblyFactory,
            json!({"object_meta": {"name": "x"}, "replicas": "three"}),
        );
        assert!(decoded.is_err());
    }

    #[test]
    fn test_parent_ids_cover_owners_and_fields() {
        let mut resource = Resource::from_value(
            ResourceKind::Permission,
            json!({"name": "rioos.job.get", "role_id": "77"}),
        )
        .unwrap();
        resource
            .envelope_mut()
            .object_meta
            .owner_references
            .push(OwnerReference {
                uid: "5".to_string(),
                ..Default::default()
            });

        assert_eq!(
            resource.parent_ids(),
            vec![ResourceId::new(5), ResourceId::new(77)]
        );
    }

    #[test]
    fn test_replace_body_requires_same_kind() {
        let mut node = Resource::from_value(ResourceKind::Node, json!({"node_ip": "10.0.0.1"})).unwrap();
        let other = Resource::from_value(ResourceKind::Node, json!({"node_ip": "10.0.0.2"})).unwrap();
        let role = Resource::from_value(ResourceKind::Role, json!({"name": "admin"})).unwrap();

        assert!(node.replace_body(other));
        assert!(!node.replace_body(role));
        assert_eq!(node.to_value().unwrap()["node_ip"], json!("10.0.0.2"));
    }

    #[test]
    fn test_list_envelope() {
        let list = ResourceList::new(ResourceKind::Build, "v1", Vec::new());
        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(value, json!({"kind": "BuildList", "api_version": "v1", "items": []}));
    }
}
