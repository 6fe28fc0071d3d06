use crate::error::{ApiError, ApiResult};
use crate::model::{OwnerRule, Resource};

/// Field presence and shape checks run before anything touches the store.
pub struct Validator;

impl Validator {
    /// Bring a client payload into canonical shape:
    /// - a blank `object_meta.name` takes the top level `name` some kinds carry;
    /// - placeholder owner references (every field blank) are dropped.
    pub fn normalize(resource: &mut Resource) {
        let display_name = resource
            .spec()
            .display_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let meta = &mut resource.envelope_mut().object_meta;
        if meta.name.is_empty() {
            if let Some(name) = display_name {
                meta.name = name;
            }
        }
        meta.owner_references.retain(|owner| !owner.is_placeholder());
    }

    /// Collect every missing or invalid field. Fails with all of them at once.
    /// A factory asking for more than `max_replicas` reports `replicas`.
    pub fn validate(resource: &Resource, max_replicas: u32) -> ApiResult<()> {
        let mut missing = Self::missing_fields(resource);
        if resource.spec().replicas().map_or(false, |count| count > max_replicas) {
            missing.push("replicas".to_string());
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::MissingParameters(missing))
        }
    }

    pub fn missing_fields(resource: &Resource) -> Vec<String> {
        let kind = resource.kind();
        let meta = resource.object_meta();
        let mut missing = Vec::new();

        if meta.name.is_empty() {
            missing.push("name".to_string());
        }
        if kind.requires_account() && meta.account.is_empty() {
            missing.push("account".to_string());
        }
        if kind.requires_cluster_name() && meta.cluster_name.is_empty() {
            missing.push("cluster_name".to_string());
        }

        let owners = &meta.owner_references;
        let owner_count_ok = match kind.owner_rule() {
            OwnerRule::Optional => true,
            OwnerRule::AtLeast(count) => owners.len() >= count,
            OwnerRule::ExactlyOne => owners.len() == 1,
        };
        if !owner_count_ok {
            missing.push("owner_references".to_string());
        }
        if owners.iter().any(|owner| owner.uid.is_empty()) {
            missing.push("owner_references.uid".to_string());
        }

        resource.spec().missing_fields(&mut missing);
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourceKind, DEFAULT_MAX_REPLICAS};
    use serde_json::{json, Value};

    fn resource(kind: ResourceKind, value: Value) -> Resource {
        let mut resource = Resource::from_value(kind, value).unwrap();
        Validator::normalize(&mut resource);
        resource
    }

    #[test]
    fn test_factory_with_zero_replicas_is_rejected() {
        let af = resource(
            ResourceKind::AssemblyFactory,
            json!({
                "object_meta": {"name": "levi.megam.io", "account": "876", "cluster_name": "chennai"},
                "replicas": 0,
                "plan": "42",
                "resources": {"compute_type": "cpu", "storage_type": "hdd"}
            }),
        );
        match Validator::validate(&af, DEFAULT_MAX_REPLICAS) {
            Err(ApiError::MissingParameters(fields)) => assert_eq!(fields, vec!["replicas"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_absent_and_empty_name_are_both_missing() {
        let absent = resource(ResourceKind::Secret, json!({
            "object_meta": {"account": "1"}, "secret_type": "opaque", "metadata": {"origin": "rioos_system"}
        }));
        let empty = resource(ResourceKind::Secret, json!({
            "object_meta": {"name": "", "account": "1"}, "secret_type": "opaque", "metadata": {"origin": "rioos_system"}
        }));
        assert_eq!(Validator::missing_fields(&absent), vec!["name"]);
        assert_eq!(Validator::missing_fields(&empty), vec!["name"]);
    }

    #[test]
    fn test_build_needs_an_owner_with_uid() {
        let build = resource(ResourceKind::Build, json!({
            "object_meta": {
                "name": "ruby-build",
                "account": "1",
                "owner_references": [{"kind": "BuildConfig", "api_version": "v1", "name": "ruby-sample-build", "uid": ""}]
            }
        }));
        assert_eq!(Validator::missing_fields(&build), vec!["owner_references.uid"]);

        let orphan = resource(ResourceKind::Build, json!({
            "object_meta": {"name": "ruby-build", "account": "1", "owner_references": []}
        }));
        assert_eq!(Validator::missing_fields(&orphan), vec!["owner_references"]);
    }

    #[test]
    fn test_placeholder_owner_is_dropped_not_rejected() {
        let af = resource(ResourceKind::AssemblyFactory, json!({
            "object_meta": {
                "name": "levi.megam.io", "account": "1", "cluster_name": "chennai",
                "owner_references": [{"kind": "", "api_version": "", "name": "", "uid": "", "block_owner_deletion": false}]
            },
            "replicas": 1,
            "plan": "42",
            "resources": {"compute_type": "cpu", "storage_type": "hdd"}
        }));
        assert!(af.object_meta().owner_references.is_empty());
        assert!(Validator::validate(&af, DEFAULT_MAX_REPLICAS).is_ok());
    }

    #[test]
    fn test_cluster_kinds_do_not_need_an_account() {
        let network = resource(ResourceKind::Network, json!({
            "object_meta": {"name": "private", "account": ""},
            "network_type": "private_ipv4",
            "subnet_ip": "192.168.1.0/24",
            "netmask": "255.255.255.0",
            "gateway": "192.168.1.1"
        }));
        assert!(Validator::validate(&network, DEFAULT_MAX_REPLICAS).is_ok());
    }

    #[test]
    fn test_top_level_name_fills_object_meta() {
        let role = resource(ResourceKind::Role, json!({
            "name": "rios:superuser", "description": "God given powers"
        }));
        assert_eq!(role.object_meta().name, "rios:superuser");
        assert!(Validator::validate(&role, DEFAULT_MAX_REPLICAS).is_ok());
    }

    #[test]
    fn test_scaling_policy_needs_exactly_one_owner() {
        let hs = resource(ResourceKind::HorizontalScaling, json!({
            "object_meta": {"name": "hzscaling", "account": "1", "owner_references": []},
            "scale_type": "AUTOHS",
            "state": "ABLETOSCALE",
            "spec": {"min_replicas": 1, "max_replicas": 2}
        }));
        assert_eq!(Validator::missing_fields(&hs), vec!["owner_references"]);
    }

    fn owner(kind: &str, uid: &str) -> Value {
        json!({"kind": kind, "api_version": "v1", "name": "levi.megam.io", "uid": uid})
    }

    #[test]
    fn test_endpoint_needs_an_owner_and_subsets() {
        let endpoint = resource(ResourceKind::Endpoint, json!({
            "object_meta": {"name": "endpnt1", "account": "1", "owner_references": []},
            "subsets": {"addresses": [], "unready_addresses": [], "ports": []}
        }));
        assert_eq!(
            Validator::missing_fields(&endpoint),
            vec!["owner_references", "subsets"]
        );
    }

    #[test]
    fn test_service_needs_an_owner() {
        let service = resource(ResourceKind::Service, json!({
            "object_meta": {"name": "lb", "account": "1"},
            "spec": {"service_type": "LoadBalancer"}
        }));
        assert_eq!(Validator::missing_fields(&service), vec!["owner_references"]);
    }

    #[test]
    fn test_ingress_needs_two_owners() {
        let ingress = |owners: Vec<Value>| {
            resource(ResourceKind::Ingress, json!({
                "object_meta": {"name": "ingress1", "account": "1", "owner_references": owners},
                "spec": {"rules": [{"host": "foo.bar.com"}]}
            }))
        };
        let single = ingress(vec![owner("AssemblyFactory", "12")]);
        assert_eq!(Validator::missing_fields(&single), vec!["owner_references"]);

        let pair = ingress(vec![owner("AssemblyFactory", "12"), owner("Service", "13")]);
        assert!(Validator::validate(&pair, DEFAULT_MAX_REPLICAS).is_ok());
    }

    #[test]
    fn test_assembly_needs_a_cluster_name() {
        let assembly = resource(ResourceKind::Assembly, json!({
            "object_meta": {"name": "levi1.megam.io", "account": "1", "cluster_name": ""}
        }));
        assert_eq!(Validator::missing_fields(&assembly), vec!["cluster_name"]);
    }

    #[test]
    fn test_replicas_above_the_limit_are_rejected() {
        let af = resource(ResourceKind::AssemblyFactory, json!({
            "object_meta": {"name": "levi.megam.io", "account": "876", "cluster_name": "chennai"},
            "replicas": 4294967295u32,
            "plan": "42",
            "resources": {"compute_type": "cpu", "storage_type": "hdd"}
        }));
        assert!(Validator::missing_fields(&af).is_empty());
        match Validator::validate(&af, DEFAULT_MAX_REPLICAS) {
            Err(ApiError::MissingParameters(fields)) => assert_eq!(fields, vec!["replicas"]),
            other => panic!("unexpected {:?}", other),
        }
        assert!(Validator::validate(&af, u32::MAX).is_ok());
    }
}
