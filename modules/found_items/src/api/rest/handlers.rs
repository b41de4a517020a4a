use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use modkit::{Problem, ProblemResponse};
use odata_core::RestPaging;
use tracing::{error, info};

use crate::api::rest::dto::{
    CategoryOptionDto, CreateFoundItemReq, FoundItemDto, ListFoundItemsQuery, StatsDto,
    UpdateFoundItemReq,
};
use crate::api::rest::error::map_domain_error;
use crate::domain::service::Service;

/// List found items with optional filters and pagination
#[utoipa::path(
    get,
    path = "/api/found-items",
    tag = "found-items",
    operation_id = "found_items.list_items",
    params(ListFoundItemsQuery),
    responses(
        (status = 200, description = "Newest items first", body = [FoundItemDto]),
        (status = 500, description = "Internal Server Error", body = Problem)
    )
)]
pub async fn list_items(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    Query(query): Query<ListFoundItemsQuery>,
) -> Result<Json<Vec<FoundItemDto>>, ProblemResponse> {
    info!("Listing found items with query: {:?}", query);

    let paging = RestPaging::parse(
        query.skip.as_deref(),
        query.limit.as_deref(),
        svc.page_limits(),
    );

    match svc.list_items((&query).into(), paging).await {
        Ok(items) => Ok(Json(items.into_iter().map(FoundItemDto::from).collect())),
        Err(e) => {
            error!("Failed to list found items: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Get a specific found item by ID
#[utoipa::path(
    get,
    path = "/api/found-items/{id}",
    tag = "found-items",
    operation_id = "found_items.get_item",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item found", body = FoundItemDto),
        (status = 404, description = "Not Found", body = Problem),
        (status = 500, description = "Internal Server Error", body = Problem)
    )
)]
pub async fn get_item(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<Json<FoundItemDto>, ProblemResponse> {
    info!("Getting found item with id: {}", id);

    match svc.get_item(&id).await {
        Ok(item) => Ok(Json(FoundItemDto::from(item))),
        Err(e) => {
            error!("Failed to get found item {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Register a new found item
#[utoipa::path(
    post,
    path = "/api/found-items",
    tag = "found-items",
    operation_id = "found_items.create_item",
    request_body = CreateFoundItemReq,
    responses(
        (status = 201, description = "Created item", body = FoundItemDto),
        (status = 400, description = "Bad Request", body = Problem),
        (status = 409, description = "Conflict", body = Problem),
        (status = 500, description = "Internal Server Error", body = Problem)
    )
)]
pub async fn create_item(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    Json(req): Json<CreateFoundItemReq>,
) -> Result<(StatusCode, Json<FoundItemDto>), ProblemResponse> {
    info!("Creating found item: {:?}", req);

    match svc.create_item(req.into()).await {
        Ok(item) => Ok((StatusCode::CREATED, Json(FoundItemDto::from(item)))),
        Err(e) => {
            error!("Failed to create found item: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Update an existing found item
#[utoipa::path(
    put,
    path = "/api/found-items/{id}",
    tag = "found-items",
    operation_id = "found_items.update_item",
    params(("id" = String, Path, description = "Item id")),
    request_body = UpdateFoundItemReq,
    responses(
        (status = 200, description = "Updated item", body = FoundItemDto),
        (status = 400, description = "Bad Request", body = Problem),
        (status = 404, description = "Not Found", body = Problem),
        (status = 500, description = "Internal Server Error", body = Problem)
    )
)]
pub async fn update_item(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    Path(id): Path<String>,
    Json(req): Json<UpdateFoundItemReq>,
) -> Result<Json<FoundItemDto>, ProblemResponse> {
    info!("Updating found item {} with: {:?}", id, req);

    match svc.update_item(&id, req.into()).await {
        Ok(item) => Ok(Json(FoundItemDto::from(item))),
        Err(e) => {
            error!("Failed to update found item {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete a found item by ID
#[utoipa::path(
    delete,
    path = "/api/found-items/{id}",
    tag = "found-items",
    operation_id = "found_items.delete_item",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Not Found", body = Problem),
        (status = 500, description = "Internal Server Error", body = Problem)
    )
)]
pub async fn delete_item(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting found item: {}", id);

    match svc.delete_item(&id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete found item {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Distinct categories for select boxes
#[utoipa::path(
    get,
    path = "/api/found-items/categories/list",
    tag = "found-items",
    operation_id = "found_items.list_categories",
    responses(
        (status = 200, description = "Categories in ascending order", body = [CategoryOptionDto]),
        (status = 500, description = "Internal Server Error", body = Problem)
    )
)]
pub async fn list_categories(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
) -> Result<Json<Vec<CategoryOptionDto>>, ProblemResponse> {
    match svc.categories().await {
        Ok(cats) => Ok(Json(cats.into_iter().map(Into::into).collect())),
        Err(e) => {
            error!("Failed to list categories: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Registry-wide counters
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "stats",
    operation_id = "found_items.stats",
    responses(
        (status = 200, description = "Totals and top-10 breakdowns", body = StatsDto),
        (status = 500, description = "Internal Server Error", body = Problem)
    )
)]
pub async fn stats(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
) -> Result<Json<StatsDto>, ProblemResponse> {
    match svc.stats().await {
        Ok(stats) => Ok(Json(stats.into())),
        Err(e) => {
            error!("Failed to compute stats: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}
