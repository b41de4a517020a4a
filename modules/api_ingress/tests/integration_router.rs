//! Integration tests for the API Ingress host: prepare → module routes → finalize.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use modkit::{Module, ModuleCtx, ModuleCtxBuilder, RestHostModule, RestfulModule};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use utoipa::{OpenApi, ToSchema};

use api_ingress::{ApiIngress, ApiIngressConfig};

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct Office {
    pub id: u32,
    pub name: String,
}

/// Fetch an office
#[utoipa::path(
    get,
    path = "/offices/{id}",
    params(("id" = u32, Path, description = "Office id")),
    responses((status = 200, description = "Office found", body = Office))
)]
async fn get_office(Path(id): Path<u32>) -> Json<Office> {
    Json(Office {
        id,
        name: format!("Office {id}"),
    })
}

#[derive(OpenApi)]
#[openapi(paths(get_office), components(schemas(Office)))]
struct OfficesDoc;

/// Minimal module publishing one route and its document.
struct TestOfficesModule;

#[async_trait]
impl Module for TestOfficesModule {
    fn name(&self) -> &'static str {
        "offices"
    }

    async fn init(&self, _ctx: &ModuleCtx) -> Result<()> {
        Ok(())
    }
}

impl RestfulModule for TestOfficesModule {
    fn register_rest(&self, _ctx: &ModuleCtx, router: Router) -> Result<Router> {
        Ok(router.route("/offices/{id}", get(get_office)))
    }

    fn openapi(&self) -> Option<utoipa::openapi::OpenApi> {
        Some(OfficesDoc::openapi())
    }
}

fn build_host(config: ApiIngressConfig) -> Result<(ApiIngress, Router)> {
    let ctx = ModuleCtxBuilder::new().build();
    let host = ApiIngress::new(config);
    let module = TestOfficesModule;

    let router = host.rest_prepare(&ctx, Router::new())?;
    let router = module.register_rest(&ctx, router)?;
    let docs = module.openapi().into_iter().collect();
    let router = host.rest_finalize(&ctx, router, docs)?;
    Ok((host, router))
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_reports_healthy() -> Result<()> {
    let (_, router) = build_host(ApiIngressConfig::default())?;
    let (status, body) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "healthy" }));
    Ok(())
}

#[tokio::test]
async fn module_routes_are_served() -> Result<()> {
    let (_, router) = build_host(ApiIngressConfig::default())?;
    let (status, body) = get_json(&router, "/offices/7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Office 7");
    Ok(())
}

#[tokio::test]
async fn openapi_merges_module_documents() -> Result<()> {
    let (_, router) = build_host(ApiIngressConfig::default())?;
    let (status, doc) = get_json(&router, "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Zguba API");
    assert!(doc["paths"].get("/health").is_some());
    assert!(doc["paths"].get("/offices/{id}").is_some());
    assert!(doc["components"]["schemas"].get("Office").is_some());
    Ok(())
}

#[tokio::test]
async fn docs_can_be_disabled() -> Result<()> {
    let (_, router) = build_host(ApiIngressConfig {
        enable_docs: false,
        ..Default::default()
    })?;
    let (status, problem) = get_json(&router, "/openapi.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(problem["instance"], "/openapi.json");
    Ok(())
}

#[tokio::test]
async fn cors_headers_when_enabled() -> Result<()> {
    let (_, router) = build_host(ApiIngressConfig {
        cors_enabled: true,
        cors_origins: vec!["https://zguba.gov.pl".into()],
        ..Default::default()
    })?;

    let resp = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "https://zguba.gov.pl")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("https://zguba.gov.pl")
    );
    Ok(())
}

#[tokio::test]
async fn finalized_router_is_kept_for_serving() -> Result<()> {
    let (host, _) = build_host(ApiIngressConfig::default())?;
    assert!(host.take_router().is_some());
    assert!(host.take_router().is_none());
    Ok(())
}
