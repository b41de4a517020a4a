use std::sync::Arc;

use axum::{
    http::{header, Uri},
    response::{IntoResponse, Json},
    Extension,
};
use modkit::{OData, Problem, ProblemResponse};
use tracing::{error, info};

use crate::api::odata::dto::ODataCollection;
use crate::api::odata::metadata::metadata_xml;
use crate::api::rest::error::map_domain_error;
use crate::domain::service::Service;

/// Transport settings of the OData surface.
#[derive(Debug, Clone)]
pub struct ODataSettings {
    pub context_url: String,
}

/// Query the registry with `$filter`, `$orderby`, `$skip`, `$top` and `$count`
#[utoipa::path(
    get,
    path = "/odata/FoundItems",
    tag = "odata",
    operation_id = "found_items.odata_query",
    params(
        ("$filter" = Option<String>, Query, description = "`eq`, `contains` and `startswith` terms joined with `and`"),
        ("$orderby" = Option<String>, Query, description = "`<field> [asc|desc]`; defaults to `created_at desc`"),
        ("$skip" = Option<String>, Query, description = "Rows to skip"),
        ("$top" = Option<String>, Query, description = "Page size, at most 100 (default 50)"),
        ("$count" = Option<String>, Query, description = "Include `odata.count`")
    ),
    responses(
        (status = 200, description = "Matching items", body = ODataCollection),
        (status = 400, description = "Rejected filter", body = Problem),
        (status = 500, description = "Query execution failed", body = Problem)
    )
)]
pub async fn query_items(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<ODataSettings>>,
    uri: Uri,
    OData(params): OData,
) -> Result<Json<ODataCollection>, ProblemResponse> {
    info!(filter = %params.filter(), orderby = %params.orderby(), "OData query");

    let paging = params.paging(svc.page_limits());
    match svc
        .query_items(params.filter(), params.orderby(), paging)
        .await
    {
        Ok(page) => Ok(Json(ODataCollection::new(settings.context_url.clone(), page))),
        Err(e) => {
            error!("OData query failed: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Service metadata document
#[utoipa::path(
    get,
    path = "/odata/$metadata",
    tag = "odata",
    operation_id = "found_items.odata_metadata",
    responses((status = 200, description = "EDMX document", content_type = "application/xml", body = String))
)]
pub async fn metadata() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], metadata_xml())
}
