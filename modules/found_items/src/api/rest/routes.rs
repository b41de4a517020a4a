use axum::routing::get;
use axum::{Extension, Router};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::Service;

pub fn register_routes(router: Router, service: Arc<Service>) -> anyhow::Result<Router> {
    // The static categories path is matched ahead of `{id}` by axum's router.
    let router = router
        .route(
            "/api/found-items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/api/found-items/categories/list",
            get(handlers::list_categories),
        )
        .route(
            "/api/found-items/{id}",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/api/stats", get(handlers::stats))
        .layer(Extension(service));

    Ok(router)
}
