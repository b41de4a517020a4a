use crate::api::problem::{Problem, ProblemResponse};
use axum::http::StatusCode;
use odata_core::Error as ODataError;

/// Map OData translation errors to RFC 9457 Problem responses.
pub fn odata_error_to_problem(e: &ODataError, instance: &str) -> ProblemResponse {
    match e {
        ODataError::InvalidFilterField(field) => Problem::coded(
            StatusCode::BAD_REQUEST,
            "ODATA_FILTER_FIELD_INVALID",
            "Unsupported filter field",
            format!("unsupported filter field: {field}"),
        )
        .with_instance(instance)
        .into(),
        ODataError::InvalidFilter(msg) => Problem::coded(
            StatusCode::BAD_REQUEST,
            "ODATA_FILTER_INVALID",
            "Filter error",
            format!("invalid $filter: {msg}"),
        )
        .with_instance(instance)
        .into(),
    }
}
