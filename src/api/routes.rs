use axum::{
    routing::{get, put},
    Extension, Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::api::handlers::{self, AppState, ParentKind};
use crate::model::ResourceKind;
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>(aggregate_timeout: Duration) -> Router<AppState<S>> {
    let mut router = Router::new().route("/health", get(handlers::health_check));

    for kind in ResourceKind::ALL {
        router = router.merge(kind_router::<S>(kind, aggregate_timeout));
    }

    router.fallback(handlers::not_found)
}

/// Every route of one kind. The kind travels to the handlers and the
/// credential gate as a request extension.
fn kind_router<S: Store + 'static>(kind: ResourceKind, aggregate_timeout: Duration) -> Router<AppState<S>> {
    let collection = kind.collection();
    // timed out aggregates answer 408
    let aggregate = || ServiceBuilder::new().layer(TimeoutLayer::new(aggregate_timeout));

    let mut router = Router::new()
        .route(
            &format!("/{}", collection),
            get(handlers::list_resources::<S>).post(handlers::create_resource::<S>),
        )
        .route(
            &format!("/{}/all", collection),
            get(handlers::list_all_resources::<S>),
        )
        .route(
            &format!("/{}/:id", collection),
            get(handlers::get_resource::<S>).put(handlers::update_resource::<S>),
        )
        .route(
            &format!("/{}/:id/status", collection),
            put(handlers::update_resource_status::<S>),
        );

    if kind.describe_child().is_some() {
        router = router.route(
            &format!("/{}/:id/describe", collection),
            get(handlers::describe_resource::<S>).layer(aggregate()),
        );
    }

    // children answer under both orderings; the parent first shape shares
    // its `:id` segment with the parent's own routes
    for parent in kind.parent_kinds() {
        router = router
            .route(
                &format!("/{}/{}/:parent_id", collection, parent.collection()),
                get(handlers::list_child_resources::<S>).layer(Extension(ParentKind(parent))),
            )
            .route(
                &format!("/{}/:id/{}", parent.collection(), collection),
                get(handlers::list_child_resources::<S>).layer(Extension(ParentKind(parent))),
            );
    }

    if kind.account_scoped() {
        router = router.route(
            &format!("/accounts/:account_id/{}", collection),
            get(handlers::list_account_resources::<S>)
                .post(handlers::create_account_resource::<S>),
        );
    }

    match kind {
        ResourceKind::HorizontalScaling => {
            router = router.route(
                &format!("/{}/:id/scale", collection),
                get(handlers::scale_horizontal::<S>).layer(aggregate()),
            );
        }
        ResourceKind::VerticalScaling => {
            router = router
                .route(
                    &format!("/{}/:id/scale", collection),
                    get(handlers::scale_vertical::<S>).layer(aggregate()),
                )
                .route(
                    &format!("/{}/scale/:id", collection),
                    get(handlers::scale_vertical::<S>).layer(aggregate()),
                );
        }
        _ => {}
    }

    router.layer(Extension(kind))
}
