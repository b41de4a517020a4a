use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use modkit::Problem;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    operation_id = "api_ingress.health",
    responses((status = 200, description = "Server is up", body = HealthStatus))
)]
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_owned(),
    })
}

/// Serves a prebuilt document; built once in `rest_finalize`.
pub async fn serve_openapi(doc: Arc<serde_json::Value>) -> Response {
    ([(header::CACHE_CONTROL, "no-store")], Json((*doc).clone())).into_response()
}

/// Problem body for unmatched routes.
pub async fn not_found(uri: Uri) -> Response {
    modkit::ProblemResponse::from(
        Problem::new(
            StatusCode::NOT_FOUND,
            "Not Found",
            format!("no route for {}", uri.path()),
        )
        .with_instance(uri.path()),
    )
    .into_response()
}
