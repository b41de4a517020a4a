use axum::http::StatusCode;
use modkit::api::odata_error_to_problem;
use modkit::{Problem, ProblemResponse, ValidationError};

use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    Problem::coded(status, code, title, detail)
        .with_instance(instance)
        .into()
}

/// `item.status` → `/item/status`
fn json_pointer(field: &str) -> String {
    format!("/{}", field.replace('.', "/"))
}

/// Map domain error to RFC 9457 Problem Details
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::ItemNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "FOUND_ITEMS_NOT_FOUND",
            "Item not found",
            format!("Found item with id {id} was not found"),
            instance,
        ),
        DomainError::ItemAlreadyExists { id } => from_parts(
            StatusCode::CONFLICT,
            "FOUND_ITEMS_ALREADY_EXISTS",
            "Item already exists",
            format!("Found item with id {id} already exists"),
            instance,
        ),
        DomainError::Validation { field, message } => Problem::coded(
            StatusCode::BAD_REQUEST,
            "FOUND_ITEMS_VALIDATION",
            "Validation error",
            format!("{field}: {message}"),
        )
        .with_instance(instance)
        .with_errors(vec![ValidationError {
            detail: message.clone(),
            pointer: json_pointer(field),
        }])
        .into(),
        DomainError::Query(err) => odata_error_to_problem(err, instance),
        DomainError::Database { message } => {
            tracing::error!(error = %message, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "FOUND_ITEMS_QUERY_FAILED",
                "Query execution failed",
                message.clone(),
                instance,
            )
        }
    }
}
