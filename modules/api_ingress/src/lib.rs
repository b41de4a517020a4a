//! HTTP host for the registry: owns the listener, the shared middleware stack
//! and the merged OpenAPI document. Feature modules only add routes.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use arc_swap::ArcSwap;
use axum::http::{HeaderValue, Method};
use axum::{middleware::from_fn, routing::get, Router};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::OpenApi;

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub const MODULE_NAME: &str = "api_ingress";

/// 16 MiB
const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Zguba API",
        version = "0.1.0",
        description = "Municipal lost & found registry"
    ),
    paths(web::health_check),
    components(schemas(web::HealthStatus))
)]
struct HostApiDoc;

/// Main API Ingress module: rest host for every other module.
pub struct ApiIngress {
    // Lock-free config using arc-swap for read-mostly access
    config: ArcSwap<ApiIngressConfig>,
    // Finalized router from the REST phase, taken by `serve`
    final_router: Mutex<Option<Router>>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            final_router: Mutex::new(None),
        }
    }

    /// Get the current configuration (cheap clone from ArcSwap)
    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    /// Overrides `request_timeout_secs`; 0 disables the timeout.
    pub fn set_request_timeout(&self, secs: u64) {
        let mut cfg = self.get_config();
        cfg.request_timeout_secs = secs;
        self.config.store(Arc::new(cfg));
    }

    /// Single document for the host and every module that published one.
    pub fn build_openapi(&self, docs: Vec<utoipa::openapi::OpenApi>) -> utoipa::openapi::OpenApi {
        let mut doc = HostApiDoc::openapi();
        for d in docs {
            doc.merge(d);
        }
        doc
    }

    fn cors_layer(cfg: &ApiIngressConfig) -> CorsLayer {
        if cfg.cors_origins.is_empty() {
            return CorsLayer::permissive();
        }
        let origins: Vec<HeaderValue> = cfg
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any)
    }

    /// Middleware order (outermost to innermost):
    /// SetRequestId -> Trace -> push_req_id_to_extensions -> PropagateRequestId -> Timeout -> CORS -> BodyLimit
    pub fn apply_middleware(&self, mut router: Router) -> Router {
        let config = self.get_config();
        let x_request_id = request_id::header();

        router = router.layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));

        if config.cors_enabled {
            router = router.layer(Self::cors_layer(&config));
        }

        if config.request_timeout_secs > 0 {
            router = router.layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )));
        }

        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(request_id::create_trace_layer());
        router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }

    /// `bind_addr` when configured, otherwise `host:port` from the server section.
    pub fn resolve_bind_addr(&self, host: &str, port: u16) -> Result<SocketAddr> {
        let cfg = self.get_config();
        let raw = if cfg.bind_addr.trim().is_empty() {
            format!("{host}:{port}")
        } else {
            cfg.bind_addr.trim().to_owned()
        };
        raw.parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", raw, e))
    }

    /// Router produced by `rest_finalize`, if it has not been taken yet.
    pub fn take_router(&self) -> Option<Router> {
        self.final_router.lock().take()
    }

    /// Bind, then serve the finalized router until `cancel` fires.
    pub async fn serve(&self, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
        // Take the finalized router so the MutexGuard is dropped before awaits
        let router = self
            .take_router()
            .ok_or_else(|| anyhow::anyhow!("REST phase has not produced a router"))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server bound on {}", addr);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

#[async_trait]
impl modkit::Module for ApiIngress {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &modkit::ModuleCtx) -> Result<()> {
        let cfg = ctx.module_config::<ApiIngressConfig>()?;
        tracing::debug!(
            module = MODULE_NAME,
            cors = cfg.cors_enabled,
            docs = cfg.enable_docs,
            "Module initialized with context"
        );
        self.config.store(Arc::new(cfg));
        Ok(())
    }
}

// REST host role: prepare/finalize the router, but do not start the server here.
impl modkit::RestHostModule for ApiIngress {
    fn rest_prepare(&self, _ctx: &modkit::ModuleCtx, router: Router) -> Result<Router> {
        tracing::debug!("REST host prepared base router with health check");
        Ok(router.route("/health", get(web::health_check)))
    }

    fn rest_finalize(
        &self,
        _ctx: &modkit::ModuleCtx,
        mut router: Router,
        docs: Vec<utoipa::openapi::OpenApi>,
    ) -> Result<Router> {
        let config = self.get_config();

        if config.enable_docs {
            // Build once, serve as static JSON (no per-request serialization of the doc)
            let doc = self.build_openapi(docs);
            tracing::info!(
                paths = doc.paths.paths.len(),
                "rest_finalize: emitting OpenAPI document"
            );
            let value = Arc::new(serde_json::to_value(&doc)?);
            router = router.route(
                "/openapi.json",
                get(move || web::serve_openapi(value.clone())),
            );
        }

        let router = self.apply_middleware(router.fallback(web::not_found));

        // Keep the finalized router to be used by `serve()`
        *self.final_router.lock() = Some(router.clone());

        tracing::debug!("REST host finalized router");
        Ok(router)
    }
}
