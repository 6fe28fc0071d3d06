use crate::model::{Resource, ResourceId, ResourceKind, Status};
use anyhow::Result;

/// Narrows a listing to one tenant and/or the children of one parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceFilter {
    pub account: Option<String>,
    pub parent: Option<ResourceId>,
}

impl ResourceFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn account(account: &str) -> Self {
        Self {
            account: Some(account.to_string()),
            parent: None,
        }
    }

    pub fn parent(parent: ResourceId) -> Self {
        Self {
            account: None,
            parent: Some(parent),
        }
    }

    pub fn matches(&self, resource: &Resource, parents: &[ResourceId]) -> bool {
        if let Some(account) = &self.account {
            if resource.account() != account {
                return false;
            }
        }
        if let Some(parent) = &self.parent {
            if !parents.contains(parent) {
                return false;
            }
        }
        true
    }
}

#[async_trait::async_trait]
pub trait ResourceStore: Send + Sync {
    /// Reserve a fresh id. Ids are unique across every kind.
    async fn next_id(&self) -> Result<ResourceId>;
    /// Insert a batch of new resources. Either all of them land or none do.
    async fn insert_resources(&self, resources: Vec<Resource>) -> Result<()>;
    async fn get_resource(&self, kind: ResourceKind, id: ResourceId) -> Result<Option<Resource>>;
    /// List a kind in id (creation) order.
    async fn list_resources(&self, kind: ResourceKind, filter: &ResourceFilter) -> Result<Vec<Resource>>;
    /// Overwrite everything but `status`, which keeps its stored value.
    /// Returns the stored result, or None when the id is unknown.
    async fn replace_spec(&self, resource: Resource) -> Result<Option<Resource>>;
}

#[async_trait::async_trait]
pub trait StatusStore: Send + Sync {
    /// Overwrite only `status`. Returns None when the id is unknown.
    async fn replace_status(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        status: Status,
    ) -> Result<Option<Resource>>;
}

pub trait Store: ResourceStore + StatusStore + Send + Sync {}
