use anyhow::Result;

use crate::model::{
    Assembly, AssemblyFactory, Envelope, Object, ObjectMeta, OwnerReference, Resource,
    ResourceId, ResourceKind, Status, TypeMeta, INITIAL_PHASE,
};
use crate::store::traits::{ResourceStore, Store};

/// Names the replicas of a factory.
///
/// A single replica reuses the factory name. Several replicas get their
/// 1-based index appended to the first DNS label: `levi.megam.io` becomes
/// `levi1.megam.io`, `levi2.megam.io`, ...
#[derive(Debug, Clone)]
pub struct ReplicaNamer {
    base: String,
}

impl ReplicaNamer {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
        }
    }

    pub fn name(&self, index: u32, total: u32) -> String {
        if total <= 1 {
            return self.base.clone();
        }
        match self.base.split_once('.') {
            Some((label, domain)) => format!("{}{}.{}", label, index, domain),
            None => format!("{}{}", self.base, index),
        }
    }

    /// Names for replicas `from..=to` of a factory that will have `total`.
    pub fn names(&self, from: u32, to: u32, total: u32) -> Vec<String> {
        (from..=to).map(|index| self.name(index, total)).collect()
    }
}

/// Expands an admitted factory into the resources it implies, so the whole
/// family lands in the store in one batch.
pub struct Assembler;

impl Assembler {
    /// Returns `primary` followed by every resource it expands into.
    pub async fn expand<S: Store>(store: &S, primary: Resource) -> Result<Vec<Resource>> {
        let mut batch = Vec::new();
        match &primary {
            Resource::AssemblyFactory(factory) => {
                batch.extend(Self::assemblies(store, factory).await?);
            }
            Resource::StacksFactory(stack) => {
                let envelope = Self::child_envelope(
                    store,
                    ResourceKind::AssemblyFactory,
                    &primary,
                    stack.envelope.object_meta.name.clone(),
                )
                .await?;
                let factory = Object::new(envelope, AssemblyFactory::from(&stack.body));
                batch.extend(Self::assemblies(store, &factory).await?);
                batch.insert(0, Resource::AssemblyFactory(factory));
            }
            _ => {}
        }
        batch.insert(0, primary);
        Ok(batch)
    }

    async fn assemblies<S: Store>(
        store: &S,
        factory: &Object<AssemblyFactory>,
    ) -> Result<Vec<Resource>> {
        let owner = Resource::AssemblyFactory(factory.clone());
        let namer = ReplicaNamer::new(&factory.envelope.object_meta.name);
        let total = factory.body.replicas;

        let mut assemblies = Vec::with_capacity(total as usize);
        for name in namer.names(1, total, total) {
            let envelope = Self::child_envelope(store, ResourceKind::Assembly, &owner, name).await?;
            let body = Assembly {
                metadata: factory.body.metadata.clone(),
                ..Default::default()
            };
            assemblies.push(Resource::Assembly(Object::new(envelope, body)));
        }
        Ok(assemblies)
    }

    /// Fresh envelope for a resource the server creates on behalf of `owner`.
    pub async fn child_envelope<S: Store>(
        store: &S,
        kind: ResourceKind,
        owner: &Resource,
        name: String,
    ) -> Result<Envelope> {
        let owner_meta = owner.object_meta();
        let object_meta = ObjectMeta {
            name,
            account: owner_meta.account.clone(),
            cluster_name: owner_meta.cluster_name.clone(),
            labels: owner_meta.labels.clone(),
            owner_references: vec![OwnerReference {
                kind: owner.kind().name().to_string(),
                api_version: owner.envelope().type_meta.api_version.clone(),
                name: owner_meta.name.clone(),
                uid: owner.id().to_string(),
                block_owner_deletion: false,
            }],
            created_at: owner_meta.created_at.clone(),
            deleted_at: String::new(),
            deletion_grace_period_seconds: owner_meta.deletion_grace_period_seconds,
            finalizers: owner_meta.finalizers.clone(),
            ..Default::default()
        };

        Ok(Envelope {
            id: store.next_id().await?,
            type_meta: TypeMeta::new(kind.name(), &owner.envelope().type_meta.api_version),
            object_meta,
            status: Status::with_phase(INITIAL_PHASE),
        })
    }

    /// Id of the factory a resource belongs to, if it has one.
    pub fn factory_of(resource: &Resource) -> Option<ResourceId> {
        resource
            .object_meta()
            .owner_references
            .iter()
            .find(|owner| owner.kind == ResourceKind::AssemblyFactory.name())
            .and_then(|owner| ResourceId::parse(&owner.uid).ok().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::API_VERSION;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_single_replica_keeps_the_name() {
        let namer = ReplicaNamer::new("levi.megam.io");
        assert_eq!(namer.name(1, 1), "levi.megam.io");
    }

    #[test]
    fn test_several_replicas_index_the_first_label() {
        let namer = ReplicaNamer::new("levi.megam.io");
        assert_eq!(
            namer.names(1, 3, 3),
            vec!["levi1.megam.io", "levi2.megam.io", "levi3.megam.io"]
        );

        let plain = ReplicaNamer::new("levi");
        assert_eq!(plain.names(1, 2, 2), vec!["levi1", "levi2"]);
    }

    async fn admitted(store: &MemoryStore, kind: ResourceKind, value: serde_json::Value) -> Resource {
        let mut resource = Resource::from_value(kind, value).unwrap();
        let envelope = resource.envelope_mut();
        envelope.id = store.next_id().await.unwrap();
        envelope.type_meta = TypeMeta::new(kind.name(), API_VERSION);
        resource
    }

    #[tokio::test]
    async fn test_factory_expands_into_owned_assemblies() {
        let store = MemoryStore::new();
        let factory = admitted(
            &store,
            ResourceKind::AssemblyFactory,
            json!({
                "object_meta": {"name": "levi.megam.io", "account": "876", "cluster_name": "chennai"},
                "replicas": 2,
                "plan": "1",
                "resources": {"compute_type": "cpu", "storage_type": "hdd"}
            }),
        )
        .await;
        let factory_id = factory.id();

        let batch = Assembler::expand(&store, factory).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].kind(), ResourceKind::AssemblyFactory);

        for (assembly, name) in batch[1..].iter().zip(["levi1.megam.io", "levi2.megam.io"]) {
            assert_eq!(assembly.kind(), ResourceKind::Assembly);
            assert_eq!(assembly.object_meta().name, name);
            assert_eq!(assembly.account(), "876");
            assert_eq!(assembly.status().phase, "pending");
            assert_eq!(Assembler::factory_of(assembly), Some(factory_id));
            assert!(assembly.id() > factory_id);
        }
    }

    #[tokio::test]
    async fn test_stacks_factory_expands_through_a_factory() {
        let store = MemoryStore::new();
        let stack = admitted(
            &store,
            ResourceKind::StacksFactory,
            json!({
                "object_meta": {"name": "stack.megam.io", "account": "876", "cluster_name": "chennai"},
                "replicas": 1,
                "plan": "1",
                "resources": {"compute_type": "cpu", "storage_type": "hdd"}
            }),
        )
        .await;
        let stack_id = stack.id();

        let batch = Assembler::expand(&store, stack).await.unwrap();
        let kinds: Vec<_> = batch.iter().map(Resource::kind).collect();
        assert_eq!(
            kinds,
            vec![ResourceKind::StacksFactory, ResourceKind::AssemblyFactory, ResourceKind::Assembly]
        );
        assert_eq!(batch[1].parent_ids(), vec![ResourceId::new(1), stack_id]);
        assert_eq!(batch[2].object_meta().name, "stack.megam.io");
        assert_eq!(Assembler::factory_of(&batch[2]), Some(batch[1].id()));
    }

    #[tokio::test]
    async fn test_other_kinds_pass_through() {
        let store = MemoryStore::new();
        let node = admitted(&store, ResourceKind::Node, json!({"node_ip": "10.0.0.1"})).await;
        let batch = Assembler::expand(&store, node).await.unwrap();
        assert_eq!(batch.len(), 1);
    }
}
