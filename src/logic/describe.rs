use anyhow::Result;

use crate::model::{Resource, ResourceKind};
use crate::store::traits::{ResourceFilter, ResourceStore, Store};

/// Joins a resource with the children it owns.
pub struct Describer;

impl Describer {
    /// Children of `parent` of its kind's primary child kind, in creation
    /// order. Kinds without a primary child yield nothing.
    pub async fn children<S: Store>(store: &S, parent: &Resource) -> Result<Option<(ResourceKind, Vec<Resource>)>> {
        let Some(child) = parent.kind().describe_child() else {
            return Ok(None);
        };
        let items = store
            .list_resources(child, &ResourceFilter::parent(parent.id()))
            .await?;
        Ok(Some((child, items)))
    }
}
