pub mod odata;
pub mod rest;

use utoipa::OpenApi;

use crate::api::odata::dto::{ODataCollection, ODataFoundItem};
use crate::api::rest::dto::{
    CategoryCountDto, CategoryOptionDto, CreateFoundItemReq, FoundItemDto, ItemDto,
    MunicipalityCountDto, MunicipalityDto, PickupDto, StatsDto, StatusCountsDto,
    UpdateFoundItemReq,
};
use modkit::{Problem, ValidationError};

#[derive(OpenApi)]
#[openapi(
    paths(
        rest::handlers::list_items,
        rest::handlers::create_item,
        rest::handlers::get_item,
        rest::handlers::update_item,
        rest::handlers::delete_item,
        rest::handlers::list_categories,
        rest::handlers::stats,
        odata::handlers::query_items,
        odata::handlers::metadata
    ),
    components(schemas(
        FoundItemDto,
        MunicipalityDto,
        ItemDto,
        PickupDto,
        CreateFoundItemReq,
        UpdateFoundItemReq,
        CategoryOptionDto,
        StatsDto,
        StatusCountsDto,
        CategoryCountDto,
        MunicipalityCountDto,
        ODataCollection,
        ODataFoundItem,
        Problem,
        ValidationError
    )),
    tags(
        (name = "found-items", description = "Registry of found items"),
        (name = "stats", description = "Registry counters"),
        (name = "odata", description = "OData read endpoint")
    )
)]
pub struct FoundItemsApiDoc;
