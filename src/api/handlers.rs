use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::identity_extractor::Authenticator;
use crate::error::{ApiError, ApiResult};
use crate::logic::{Registry, ResourceRecommendation, ScaledFactory};
use crate::model::{Identity, Resource, ResourceKind, ResourceList};
use crate::store::traits::Store;

/// Shared handler state: the registry over the configured store plus the
/// credential table.
pub struct AppState<S> {
    pub registry: Registry<S>,
    pub auth: Arc<Authenticator>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(registry: Registry<S>, auth: Authenticator) -> Self {
        Self {
            registry,
            auth: Arc::new(auth),
        }
    }
}

/// Parent kind of a list-by-parent route.
#[derive(Debug, Clone, Copy)]
pub struct ParentKind(pub ResourceKind);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("no such route".to_string())
}

pub async fn create_resource<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(kind): Extension<ResourceKind>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<Json<Resource>> {
    let resource = state.registry.create(kind, &body, None, &identity).await?;
    Ok(Json(resource))
}

pub async fn create_account_resource<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(kind): Extension<ResourceKind>,
    Path(account_id): Path<String>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<Json<Resource>> {
    let resource = state
        .registry
        .create(kind, &body, Some(&account_id), &identity)
        .await?;
    Ok(Json(resource))
}

pub async fn get_resource<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(kind): Extension<ResourceKind>,
    Path(id): Path<String>,
    _identity: Identity,
) -> ApiResult<Json<Resource>> {
    Ok(Json(state.registry.get(kind, &id).await?))
}

pub async fn list_resources<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(kind): Extension<ResourceKind>,
    _identity: Identity,
) -> ApiResult<Json<ResourceList>> {
    Ok(Json(state.registry.list(kind).await?))
}

pub async fn list_all_resources<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(kind): Extension<ResourceKind>,
    _identity: Identity,
) -> ApiResult<Json<ResourceList>> {
    Ok(Json(state.registry.list_all(kind).await?))
}

pub async fn list_account_resources<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(kind): Extension<ResourceKind>,
    Path(account_id): Path<String>,
    _identity: Identity,
) -> ApiResult<Json<ResourceList>> {
    Ok(Json(state.registry.list_by_account(kind, &account_id).await?))
}

pub async fn list_child_resources<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(kind): Extension<ResourceKind>,
    Extension(ParentKind(parent)): Extension<ParentKind>,
    Path(parent_id): Path<String>,
    _identity: Identity,
) -> ApiResult<Json<ResourceList>> {
    Ok(Json(
        state.registry.list_children(kind, parent, &parent_id).await?,
    ))
}

pub async fn update_resource<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(kind): Extension<ResourceKind>,
    Path(id): Path<String>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<Json<Resource>> {
    Ok(Json(state.registry.update(kind, &id, &body, &identity).await?))
}

pub async fn update_resource_status<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(kind): Extension<ResourceKind>,
    Path(id): Path<String>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<Json<Resource>> {
    Ok(Json(
        state
            .registry
            .update_status(kind, &id, &body, &identity)
            .await?,
    ))
}

pub async fn describe_resource<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(kind): Extension<ResourceKind>,
    Path(id): Path<String>,
    _identity: Identity,
) -> ApiResult<Json<ResourceList>> {
    Ok(Json(state.registry.describe(kind, &id).await?))
}

pub async fn scale_horizontal<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    _identity: Identity,
) -> ApiResult<Json<ScaledFactory>> {
    Ok(Json(state.registry.scale_horizontal(&id).await?))
}

pub async fn scale_vertical<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    _identity: Identity,
) -> ApiResult<Json<ResourceRecommendation>> {
    Ok(Json(state.registry.scale_vertical(&id).await?))
}
