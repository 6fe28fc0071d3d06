use anyhow::Context;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::logic::assembler::Assembler;
use crate::logic::describe::Describer;
use crate::logic::resolve::ReferenceResolver;
use crate::logic::scaling::{MetricsSource, ResourceRecommendation, ScaledFactory, ScalingPlan};
use crate::logic::validate::Validator;
use crate::model::{
    now_rfc3339, Identity, Resource, ResourceId, ResourceKind, ResourceList, Status,
    StatusUpdate, TypeMeta, DEFAULT_GRACE_PERIOD_SECONDS, DEFAULT_MAX_REPLICAS, INITIAL_PHASE,
    ORPHAN_FINALIZER,
};
use crate::store::traits::{ResourceFilter, ResourceStore, StatusStore, Store};

/// Resource lifecycle on top of a [`Store`]: admission, lookup, listing,
/// spec and status updates, and the read aggregations.
pub struct Registry<S> {
    store: Arc<S>,
    api_version: String,
    metrics: Arc<dyn MetricsSource>,
    max_replicas: u32,
}

impl<S> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            api_version: self.api_version.clone(),
            metrics: self.metrics.clone(),
            max_replicas: self.max_replicas,
        }
    }
}

/// Id taken from a URL: non-digits are a 400, well formed but unassignable a 404.
pub fn parse_id(kind: ResourceKind, raw: &str) -> ApiResult<ResourceId> {
    match ResourceId::parse(raw) {
        Ok(Some(id)) => Ok(id),
        Ok(None) => Err(ApiError::NotFound(format!("{} {} not found", kind, raw))),
        Err(_) => Err(ApiError::MustBeNumeric(format!("id {}", raw))),
    }
}

fn parse_account(raw: &str) -> ApiResult<&str> {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        Ok(raw)
    } else {
        Err(ApiError::MustBeNumeric(format!("account {}", raw)))
    }
}

fn not_found(kind: ResourceKind, id: ResourceId) -> ApiError {
    ApiError::NotFound(format!("{} {} not found", kind, id))
}

impl<S: Store> Registry<S> {
    pub fn new(store: Arc<S>, api_version: &str, metrics: Arc<dyn MetricsSource>) -> Self {
        Self {
            store,
            api_version: api_version.to_string(),
            metrics,
            max_replicas: DEFAULT_MAX_REPLICAS,
        }
    }

    pub fn with_max_replicas(mut self, max_replicas: u32) -> Self {
        self.max_replicas = max_replicas;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn list_of(&self, kind: ResourceKind, items: Vec<Resource>) -> ResourceList {
        ResourceList::new(kind, &self.api_version, items)
    }

    /// Decode, normalize, validate and resolve a client payload.
    async fn admit_payload(&self, kind: ResourceKind, body: &[u8]) -> ApiResult<Resource> {
        let mut resource = Resource::from_slice(kind, body).map_err(ApiError::malformed)?;
        Validator::normalize(&mut resource);
        Validator::validate(&resource, self.max_replicas)?;
        ReferenceResolver::resolve(self.store.as_ref(), &mut resource).await?;
        Ok(resource)
    }

    /// Server side fields of a freshly admitted resource.
    fn stamp(&self, resource: &mut Resource, id: ResourceId) {
        let kind = resource.kind();
        let envelope = resource.envelope_mut();
        envelope.id = id;
        envelope.type_meta = TypeMeta::new(kind.name(), &self.api_version);

        let meta = &mut envelope.object_meta;
        meta.created_at = now_rfc3339();
        meta.deleted_at = String::new();
        meta.finalizers = vec![ORPHAN_FINALIZER.to_string()];
        meta.deletion_grace_period_seconds = DEFAULT_GRACE_PERIOD_SECONDS;

        if envelope.status.phase.is_empty() {
            envelope.status.phase = INITIAL_PHASE.to_string();
        }
    }

    /// Admit a new resource, plus whatever it expands into, in one batch.
    /// `account` comes from an account scoped route and wins over the body.
    pub async fn create(
        &self,
        kind: ResourceKind,
        body: &[u8],
        account: Option<&str>,
        identity: &Identity,
    ) -> ApiResult<Resource> {
        let account = account.map(parse_account).transpose()?;
        let mut resource = match self.admit_payload(kind, body).await {
            Ok(resource) => resource,
            Err(err) => {
                log::debug!("Rejected {} from {}: {}", kind, identity.email, err);
                return Err(err);
            }
        };
        if let Some(account) = account {
            resource.envelope_mut().object_meta.account = account.to_string();
        }

        let id = self.store.next_id().await?;
        self.stamp(&mut resource, id);

        let batch = Assembler::expand(self.store.as_ref(), resource.clone()).await?;
        let expanded = batch.len() - 1;
        self.store.insert_resources(batch).await?;

        log::info!(
            "Created {} {} '{}' for {} [{}] (+{} expanded)",
            kind,
            id,
            resource.object_meta().name,
            identity.email,
            identity.token_fingerprint,
            expanded
        );
        Ok(resource)
    }

    pub async fn get(&self, kind: ResourceKind, raw_id: &str) -> ApiResult<Resource> {
        let id = parse_id(kind, raw_id)?;
        self.store
            .get_resource(kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))
    }

    /// Every resource of a kind; empty is fine.
    pub async fn list(&self, kind: ResourceKind) -> ApiResult<ResourceList> {
        let items = self.store.list_resources(kind, &ResourceFilter::all()).await?;
        Ok(self.list_of(kind, items))
    }

    /// Every resource of a kind; empty is a 404.
    pub async fn list_all(&self, kind: ResourceKind) -> ApiResult<ResourceList> {
        let items = self.store.list_resources(kind, &ResourceFilter::all()).await?;
        if items.is_empty() {
            return Err(ApiError::NotFound(format!("no {} found", kind)));
        }
        Ok(self.list_of(kind, items))
    }

    pub async fn list_by_account(&self, kind: ResourceKind, raw_account: &str) -> ApiResult<ResourceList> {
        let account = parse_account(raw_account)?;
        let items = self
            .store
            .list_resources(kind, &ResourceFilter::account(account))
            .await?;
        if items.is_empty() {
            return Err(ApiError::NotFound(format!("no {} in account {}", kind, account)));
        }
        Ok(self.list_of(kind, items))
    }

    /// Resources of `kind` that reference the `parent` resource.
    pub async fn list_children(
        &self,
        kind: ResourceKind,
        parent: ResourceKind,
        raw_parent_id: &str,
    ) -> ApiResult<ResourceList> {
        let parent_id = parse_id(parent, raw_parent_id)?;
        let items = self
            .store
            .list_resources(kind, &ResourceFilter::parent(parent_id))
            .await?;
        if items.is_empty() {
            return Err(ApiError::NotFound(format!(
                "no {} for {} {}",
                kind, parent, parent_id
            )));
        }
        Ok(self.list_of(kind, items))
    }

    /// Replace the spec side of a resource. Identity, ownership of the
    /// account, creation stamps and status are kept from the stored copy.
    pub async fn update(
        &self,
        kind: ResourceKind,
        raw_id: &str,
        body: &[u8],
        identity: &Identity,
    ) -> ApiResult<Resource> {
        let id = parse_id(kind, raw_id)?;
        let mut stored = self
            .store
            .get_resource(kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))?;

        let mut incoming = Resource::from_slice(kind, body).map_err(ApiError::malformed)?;
        Validator::normalize(&mut incoming);
        if incoming.object_meta().account.is_empty() {
            incoming.envelope_mut().object_meta.account = stored.account().to_string();
        }
        Validator::validate(&incoming, self.max_replicas)?;
        ReferenceResolver::resolve(self.store.as_ref(), &mut incoming).await?;

        let meta = incoming.object_meta().clone();
        stored.replace_body(incoming);
        let target = &mut stored.envelope_mut().object_meta;
        target.name = meta.name;
        target.labels = meta.labels;
        target.annotations = meta.annotations;
        target.owner_references = meta.owner_references;
        target.cluster_name = meta.cluster_name;
        target.initializers = meta.initializers;

        let updated = self
            .store
            .replace_spec(stored)
            .await?
            .ok_or_else(|| not_found(kind, id))?;
        log::info!("Updated {} {} for {}", kind, id, identity.email);
        Ok(updated)
    }

    /// Replace only the status. The new phase must be present and non-empty.
    pub async fn update_status(
        &self,
        kind: ResourceKind,
        raw_id: &str,
        body: &[u8],
        identity: &Identity,
    ) -> ApiResult<Resource> {
        let id = parse_id(kind, raw_id)?;
        let update: StatusUpdate = serde_json::from_slice(body).map_err(ApiError::malformed)?;
        if update.status.phase.is_empty() {
            return Err(ApiError::MissingParameters(vec!["status.phase".to_string()]));
        }

        let status = Status::from(update.status);
        let phase = status.phase.clone();
        let updated = self
            .store
            .replace_status(kind, id, status)
            .await?
            .ok_or_else(|| not_found(kind, id))?;

        log::info!("Status of {} {} is now '{}' ({})", kind, id, phase, identity.email);
        Ok(updated)
    }

    /// The primary children of a resource, e.g. the Assemblys of a factory.
    pub async fn describe(&self, kind: ResourceKind, raw_id: &str) -> ApiResult<ResourceList> {
        let parent = self.get(kind, raw_id).await?;
        match Describer::children(self.store.as_ref(), &parent).await? {
            Some((child, items)) => Ok(self.list_of(child, items)),
            None => Err(ApiError::NotFound(format!("{} has nothing to describe", kind))),
        }
    }

    pub async fn scale_horizontal(&self, raw_id: &str) -> ApiResult<ScaledFactory> {
        let resource = self.get(ResourceKind::HorizontalScaling, raw_id).await?;
        let factory = self.factory_for(&resource).await?;
        let assemblies = self
            .store
            .list_resources(ResourceKind::Assembly, &ResourceFilter::parent(factory.id()))
            .await?;

        match &resource {
            Resource::HorizontalScaling(policy) => {
                let scaling = ScalingPlan::compute(policy, &factory, &assemblies);
                Ok(ScaledFactory { factory, scaling })
            }
            other => Err(ApiError::Internal(anyhow::anyhow!(
                "stored {} under horizontalscaling",
                other.kind()
            ))),
        }
    }

    pub async fn scale_vertical(&self, raw_id: &str) -> ApiResult<ResourceRecommendation> {
        let resource = self.get(ResourceKind::VerticalScaling, raw_id).await?;
        let factory = self.factory_for(&resource).await?;
        let usage = self
            .metrics
            .usage(factory.id())
            .await
            .with_context(|| format!("Failed to read metrics for {}", resource.id()))?;

        match &resource {
            Resource::VerticalScaling(policy) => {
                Ok(ResourceRecommendation::compute(policy, factory.id(), &usage))
            }
            other => Err(ApiError::Internal(anyhow::anyhow!(
                "stored {} under verticalscaling",
                other.kind()
            ))),
        }
    }

    async fn factory_for(&self, policy: &Resource) -> ApiResult<Resource> {
        let factory_id = Assembler::factory_of(policy).ok_or_else(|| {
            ApiError::BadRequest(format!("{} {} has no AssemblyFactory owner", policy.kind(), policy.id()))
        })?;
        self.store
            .get_resource(ResourceKind::AssemblyFactory, factory_id)
            .await?
            .ok_or_else(|| not_found(ResourceKind::AssemblyFactory, factory_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scaling::{StaticMetrics, UnavailableMetrics};
    use crate::store::MemoryStore;
    use serde_json::{json, Value};

    fn registry() -> Registry<MemoryStore> {
        Registry::new(Arc::new(MemoryStore::new()), "v1", Arc::new(UnavailableMetrics))
    }

    fn who() -> Identity {
        Identity::new("info@riocorp.io", "token")
    }

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    async fn plan(registry: &Registry<MemoryStore>) -> Resource {
        registry
            .create(
                ResourceKind::Plan,
                &body(json!({"object_meta": {"name": "ubuntu"}, "category": "machine", "version": "16.04"})),
                None,
                &who(),
            )
            .await
            .unwrap()
    }

    fn factory_body(plan: &Resource, replicas: u32) -> Vec<u8> {
        body(json!({
            "object_meta": {"name": "levi.megam.io", "account": "876", "cluster_name": "chennai",
                "owner_references": [{"kind": "", "api_version": "", "name": "", "uid": "", "block_owner_deletion": false}]},
            "replicas": replicas,
            "resources": {"compute_type": "cpu", "storage_type": "hdd"},
            "secret": {"id": ""},
            "plan": plan.id().to_string()
        }))
    }

    #[tokio::test]
    async fn test_create_stamps_server_fields() {
        let registry = registry();
        let plan = plan(&registry).await;

        assert!(plan.id().is_assigned());
        assert_eq!(plan.envelope().type_meta.kind, "Plan");
        assert_eq!(plan.envelope().type_meta.api_version, "v1");
        assert_eq!(plan.object_meta().finalizers, vec!["orphan"]);
        assert_eq!(plan.object_meta().deletion_grace_period_seconds, 30);
        assert!(!plan.object_meta().created_at.is_empty());
        assert_eq!(plan.status().phase, "pending");

        let fetched = registry.get(ResourceKind::Plan, &plan.id().to_string()).await.unwrap();
        assert_eq!(fetched, plan);
    }

    #[tokio::test]
    async fn test_rejected_factory_leaves_no_trace() {
        let registry = registry();
        let plan = plan(&registry).await;

        let err = registry
            .create(ResourceKind::AssemblyFactory, &factory_body(&plan, 0), None, &who())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingParameters(_)));
        assert_eq!(registry.store().count(ResourceKind::AssemblyFactory), 0);
        assert_eq!(registry.store().count(ResourceKind::Assembly), 0);
    }

    #[tokio::test]
    async fn test_replica_limit_rejects_without_side_effects() {
        let registry = registry().with_max_replicas(5);
        let plan = plan(&registry).await;

        let err = registry
            .create(ResourceKind::AssemblyFactory, &factory_body(&plan, 6), None, &who())
            .await
            .unwrap_err();
        match err {
            ApiError::MissingParameters(fields) => assert_eq!(fields, vec!["replicas"]),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(registry.store().count(ResourceKind::AssemblyFactory), 0);
        assert_eq!(registry.store().count(ResourceKind::Assembly), 0);

        registry
            .create(ResourceKind::AssemblyFactory, &factory_body(&plan, 5), None, &who())
            .await
            .unwrap();
        assert_eq!(registry.store().count(ResourceKind::Assembly), 5);
    }

    #[tokio::test]
    async fn test_factory_creates_replicas_and_describes_them() {
        let registry = registry();
        let plan = plan(&registry).await;
        let factory = registry
            .create(ResourceKind::AssemblyFactory, &factory_body(&plan, 2), None, &who())
            .await
            .unwrap();

        let described = registry
            .describe(ResourceKind::AssemblyFactory, &factory.id().to_string())
            .await
            .unwrap();
        assert_eq!(described.kind, "AssemblyList");
        assert_eq!(described.items.len(), 2);

        let by_plan = registry
            .list_children(ResourceKind::AssemblyFactory, ResourceKind::Plan, &plan.id().to_string())
            .await
            .unwrap();
        assert_eq!(by_plan.items.len(), 1);
    }

    #[tokio::test]
    async fn test_id_shape_decides_between_400_and_404() {
        let registry = registry();
        assert!(matches!(
            registry.get(ResourceKind::BuildConfig, "8907654345677").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            registry.get(ResourceKind::BuildConfig, "890765uikj4345677").await,
            Err(ApiError::MustBeNumeric(_))
        ));
    }

    #[tokio::test]
    async fn test_status_and_spec_updates_do_not_touch_each_other() {
        let registry = registry();
        let node = registry
            .create(
                ResourceKind::Node,
                &body(json!({"object_meta": {"name": "n1"}, "node_ip": "10.0.0.1", "status": {"phase": "pending"}})),
                None,
                &who(),
            )
            .await
            .unwrap();
        let raw_id = node.id().to_string();

        let ready = registry
            .update_status(ResourceKind::Node, &raw_id, &body(json!({"status": {"phase": "ready"}})), &who())
            .await
            .unwrap();
        assert_eq!(ready.id(), node.id());
        assert_eq!(ready.status().phase, "ready");
        assert_eq!(ready.object_meta(), node.object_meta());

        let respec = registry
            .update(
                ResourceKind::Node,
                &raw_id,
                &body(json!({"object_meta": {"name": "n1-renamed"}, "node_ip": "10.0.0.2", "status": {"phase": "stale"}})),
                &who(),
            )
            .await
            .unwrap();
        assert_eq!(respec.status().phase, "ready");
        assert_eq!(respec.object_meta().name, "n1-renamed");
        assert_eq!(respec.object_meta().created_at, node.object_meta().created_at);
        assert_eq!(respec.to_value().unwrap()["node_ip"], json!("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_status_phase_rules() {
        let registry = registry();
        let missing = registry
            .update_status(ResourceKind::Node, "1", &body(json!({"status": {"message": "x"}})), &who())
            .await;
        assert!(matches!(missing, Err(ApiError::MalformedBody(_))));

        let empty = registry
            .update_status(ResourceKind::Node, "1", &body(json!({"status": {"phase": ""}})), &who())
            .await;
        assert!(matches!(empty, Err(ApiError::MissingParameters(_))));

        let unknown = registry
            .update_status(ResourceKind::Node, "1", &body(json!({"status": {"phase": "ready"}})), &who())
            .await;
        assert!(matches!(unknown, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_account_route_overrides_body_account() {
        let registry = registry();
        let secret = body(json!({
            "object_meta": {"name": "ca", "account": "1"},
            "secret_type": "opaque",
            "metadata": {"origin": "rioos_system"}
        }));
        let created = registry
            .create(ResourceKind::Secret, &secret, Some("9876"), &who())
            .await
            .unwrap();
        assert_eq!(created.account(), "9876");

        let listed = registry.list_by_account(ResourceKind::Secret, "9876").await.unwrap();
        assert_eq!(listed.items.len(), 1);
        assert!(matches!(
            registry.list_by_account(ResourceKind::Secret, "1").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            registry.create(ResourceKind::Secret, &secret, Some("abc"), &who()).await,
            Err(ApiError::MustBeNumeric(_))
        ));
    }

    #[tokio::test]
    async fn test_vertical_scale_needs_metrics() {
        let store = Arc::new(MemoryStore::new());
        let without = Registry::new(store.clone(), "v1", Arc::new(UnavailableMetrics));
        let with = Registry::new(
            store,
            "v1",
            Arc::new(StaticMetrics::new([("cpu".to_string(), 9.0)])),
        );

        let plan = plan(&without).await;
        let factory = without
            .create(ResourceKind::AssemblyFactory, &factory_body(&plan, 1), None, &who())
            .await
            .unwrap();
        let vs = without
            .create(
                ResourceKind::VerticalScaling,
                &body(json!({
                    "object_meta": {"name": "vs", "account": "876",
                        "owner_references": [{"kind": "", "uid": factory.id().to_string()}]},
                    "scale_type": "AUTOVS",
                    "spec": {"min_resource": {"cpu": "2"}, "max_resource": {"cpu": "4"}}
                })),
                None,
                &who(),
            )
            .await
            .unwrap();
        let raw_id = vs.id().to_string();

        assert!(matches!(
            without.scale_vertical(&raw_id).await,
            Err(ApiError::Internal(_))
        ));

        let rec = with.scale_vertical(&raw_id).await.unwrap();
        assert_eq!(rec.factory_id, factory.id());
        assert_eq!(rec.desired_resource["cpu"], "4");
    }

    #[tokio::test]
    async fn test_horizontal_scale_answers_with_the_factory() {
        let registry = registry();
        let plan = plan(&registry).await;
        let factory = registry
            .create(ResourceKind::AssemblyFactory, &factory_body(&plan, 2), None, &who())
            .await
            .unwrap();
        let hs = registry
            .create(
                ResourceKind::HorizontalScaling,
                &body(json!({
                    "object_meta": {"name": "hz", "account": "876",
                        "owner_references": [{"kind": "", "uid": factory.id().to_string()}]},
                    "scale_type": "AUTOHS",
                    "state": "ABLETOSCALE",
                    "spec": {"min_replicas": 1, "max_replicas": 4},
                    "status": {"phase": "pending", "desired_replicas": 3}
                })),
                None,
                &who(),
            )
            .await
            .unwrap();

        let scaled = registry.scale_horizontal(&hs.id().to_string()).await.unwrap();
        assert_eq!(scaled.factory.id(), factory.id());
        assert_eq!(scaled.scaling.current_replicas, 2);

        let value = serde_json::to_value(&scaled).unwrap();
        assert_eq!(value["id"], json!(factory.id().to_string()));
        assert_eq!(value["type_meta"]["kind"], json!("AssemblyFactory"));
        assert_eq!(value["scaling"]["factory_id"], value["id"]);
    }
}
