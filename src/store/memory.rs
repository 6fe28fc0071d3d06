use anyhow::{bail, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use crate::model::{IdGenerator, Resource, ResourceId, ResourceKind, Status};
use crate::store::traits::{ResourceFilter, ResourceStore, StatusStore, Store};

#[derive(Debug, Clone)]
struct Entry {
    resource: Resource,
    parents: Vec<ResourceId>,
}

impl Entry {
    fn new(resource: Resource) -> Self {
        let parents = resource.parent_ids();
        Self { resource, parents }
    }
}

/// Process local registry: one id ordered collection per kind behind a
/// single lock, so a batch insert is all or nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ids: IdGenerator,
    collections: RwLock<HashMap<ResourceKind, BTreeMap<ResourceId, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored resources of a kind.
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.collections
            .read()
            .get(&kind)
            .map_or(0, |collection| collection.len())
    }
}

#[async_trait::async_trait]
impl ResourceStore for MemoryStore {
    async fn next_id(&self) -> Result<ResourceId> {
        Ok(self.ids.next_id())
    }

    async fn insert_resources(&self, resources: Vec<Resource>) -> Result<()> {
        let mut collections = self.collections.write();

        for (index, resource) in resources.iter().enumerate() {
            let id = resource.id();
            if !id.is_assigned() {
                bail!("{} '{}' has no id", resource.kind(), resource.object_meta().name);
            }
            let taken = collections
                .get(&resource.kind())
                .map_or(false, |collection| collection.contains_key(&id))
                || resources[..index].iter().any(|other| other.id() == id);
            if taken {
                bail!("{} {} already exists", resource.kind(), id);
            }
        }

        for resource in resources {
            collections
                .entry(resource.kind())
                .or_default()
                .insert(resource.id(), Entry::new(resource));
        }
        Ok(())
    }

    async fn get_resource(&self, kind: ResourceKind, id: ResourceId) -> Result<Option<Resource>> {
        Ok(self
            .collections
            .read()
            .get(&kind)
            .and_then(|collection| collection.get(&id))
            .map(|entry| entry.resource.clone()))
    }

    async fn list_resources(&self, kind: ResourceKind, filter: &ResourceFilter) -> Result<Vec<Resource>> {
        Ok(self
            .collections
            .read()
            .get(&kind)
            .map(|collection| {
                collection
                    .values()
                    .filter(|entry| filter.matches(&entry.resource, &entry.parents))
                    .map(|entry| entry.resource.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn replace_spec(&self, mut resource: Resource) -> Result<Option<Resource>> {
        let mut collections = self.collections.write();
        let Some(entry) = collections
            .get_mut(&resource.kind())
            .and_then(|collection| collection.get_mut(&resource.id()))
        else {
            return Ok(None);
        };

        resource.envelope_mut().status = entry.resource.status().clone();
        *entry = Entry::new(resource);
        Ok(Some(entry.resource.clone()))
    }
}

#[async_trait::async_trait]
impl StatusStore for MemoryStore {
    async fn replace_status(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        status: Status,
    ) -> Result<Option<Resource>> {
        let mut collections = self.collections.write();
        let Some(entry) = collections
            .get_mut(&kind)
            .and_then(|collection| collection.get_mut(&id))
        else {
            return Ok(None);
        };

        entry.resource.envelope_mut().status = status;
        Ok(Some(entry.resource.clone()))
    }
}

impl Store for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OwnerReference;
    use serde_json::json;

    async fn node(store: &MemoryStore, ip: &str) -> Resource {
        let mut resource = Resource::from_value(
            ResourceKind::Node,
            json!({"object_meta": {"name": ip}, "node_ip": ip}),
        )
        .unwrap();
        resource.envelope_mut().id = store.next_id().await.unwrap();
        resource
    }

    #[tokio::test]
    async fn test_batch_insert_is_all_or_nothing() {
        let store = MemoryStore::new();
        let first = node(&store, "10.0.0.1").await;
        let duplicate = first.clone();

        let result = store.insert_resources(vec![first, duplicate]).await;
        assert!(result.is_err());
        assert_eq!(store.count(ResourceKind::Node), 0);
    }

    #[tokio::test]
    async fn test_list_in_id_order_with_parent_filter() {
        let store = MemoryStore::new();
        let parent = node(&store, "10.0.0.1").await;
        let parent_id = parent.id();

        let mut job = Resource::from_value(
            ResourceKind::Job,
            json!({"object_meta": {"name": "deploy", "account": "1"}, "spec": {"group": "assembly", "action": "deploy"}}),
        )
        .unwrap();
        job.envelope_mut().id = store.next_id().await.unwrap();
        job.envelope_mut().object_meta.owner_references.push(OwnerReference {
            kind: "Node".to_string(),
            uid: parent_id.to_string(),
            ..Default::default()
        });
        let job_id = job.id();

        store.insert_resources(vec![parent, job]).await.unwrap();

        let children = store
            .list_resources(ResourceKind::Job, &ResourceFilter::parent(parent_id))
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id(), job_id);

        let none = store
            .list_resources(ResourceKind::Job, &ResourceFilter::parent(job_id))
            .await
            .unwrap();
        assert!(none.is_empty());

        let by_account = store
            .list_resources(ResourceKind::Job, &ResourceFilter::account("1"))
            .await
            .unwrap();
        assert_eq!(by_account.len(), 1);
    }

    #[tokio::test]
    async fn test_spec_and_status_writes_are_isolated() {
        let store = MemoryStore::new();
        let original = node(&store, "10.0.0.1").await;
        let id = original.id();
        store.insert_resources(vec![original.clone()]).await.unwrap();

        let updated = store
            .replace_status(ResourceKind::Node, id, Status::with_phase("ready"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status().phase, "ready");

        let mut respec = original.clone();
        respec.envelope_mut().status = Status::with_phase("stale");
        respec.envelope_mut().object_meta.name = "renamed".to_string();
        let stored = store.replace_spec(respec).await.unwrap().unwrap();

        assert_eq!(stored.status().phase, "ready");
        assert_eq!(stored.object_meta().name, "renamed");

        let missing = store
            .replace_status(ResourceKind::Node, ResourceId::new(1), Status::with_phase("x"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
