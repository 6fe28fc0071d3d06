use crate::error::{ApiError, ApiResult};
use crate::model::{OwnerReference, Resource, ResourceId, ResourceKind, API_VERSION};
use crate::store::traits::{ResourceStore, Store};

/// Confirms that every reference in a payload points at an existing
/// resource of an allowed kind. Runs after validation, before any write.
pub struct ReferenceResolver;

impl ReferenceResolver {
    pub async fn resolve<S: Store>(store: &S, resource: &mut Resource) -> ApiResult<()> {
        let kind = resource.kind();

        let mut owners = std::mem::take(&mut resource.envelope_mut().object_meta.owner_references);
        let mut outcome = Ok(());
        for owner in owners.iter_mut() {
            if let Err(err) = Self::resolve_owner(store, kind, owner).await {
                outcome = Err(err);
                break;
            }
        }
        resource.envelope_mut().object_meta.owner_references = owners;
        outcome?;

        for reference in resource.spec().field_references() {
            if reference.uid.is_empty() {
                // blank required fields were already reported by validation
                continue;
            }
            let id = Self::parse_uid(reference.field, &reference.uid)?;
            if store.get_resource(reference.kind, id).await?.is_none() {
                return Err(ApiError::BadRequest(format!(
                    "{} references unknown {} {}",
                    reference.field, reference.kind, reference.uid
                )));
            }
        }

        Ok(())
    }

    /// Look the owner up among the kinds allowed to own `child`. A blank
    /// `kind` tries each of them; the match fills the blanks in.
    async fn resolve_owner<S: Store>(
        store: &S,
        child: ResourceKind,
        owner: &mut OwnerReference,
    ) -> ApiResult<()> {
        let allowed = child.owner_kinds();
        let candidates: Vec<ResourceKind> = if owner.kind.is_empty() {
            allowed.to_vec()
        } else {
            match ResourceKind::from_name(&owner.kind) {
                Some(kind) if allowed.contains(&kind) => vec![kind],
                _ => {
                    return Err(ApiError::BadRequest(format!(
                        "{} cannot be owned by {}",
                        child, owner.kind
                    )))
                }
            }
        };

        let id = Self::parse_uid("owner_references.uid", &owner.uid)?;
        for kind in candidates {
            if let Some(parent) = store.get_resource(kind, id).await? {
                owner.kind = kind.name().to_string();
                if owner.api_version.is_empty() {
                    owner.api_version = API_VERSION.to_string();
                }
                if owner.name.is_empty() {
                    owner.name = parent.object_meta().name.clone();
                }
                return Ok(());
            }
        }

        Err(ApiError::BadRequest(format!(
            "owner reference {} does not resolve for {}",
            owner.uid, child
        )))
    }

    fn parse_uid(field: &str, uid: &str) -> ApiResult<ResourceId> {
        match ResourceId::parse(uid) {
            Ok(Some(id)) => Ok(id),
            _ => Err(ApiError::BadRequest(format!("{} is not a valid id: {}", field, uid))),
        }
    }
}
