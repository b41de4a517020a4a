pub mod dto;
pub mod handlers;
pub mod metadata;

use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};

use crate::domain::service::Service;
use handlers::ODataSettings;

pub fn register_routes(
    router: Router,
    service: Arc<Service>,
    settings: ODataSettings,
) -> anyhow::Result<Router> {
    let router = router
        .route("/odata/FoundItems", get(handlers::query_items))
        .route("/odata/$metadata", get(handlers::metadata))
        .layer(Extension(Arc::new(settings)))
        .layer(Extension(service));

    Ok(router)
}
