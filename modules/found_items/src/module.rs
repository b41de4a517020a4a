use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use axum::Router;
use tracing::{debug, info};
use utoipa::OpenApi;

use modkit::{DbModule, Module, ModuleCtx, RestfulModule};

use crate::api::odata::handlers::ODataSettings;
use crate::api::FoundItemsApiDoc;
use crate::config::FoundItemsConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::{fields, migrations, sqlx_repo::SqlxFoundItemsRepository};

pub const MODULE_NAME: &str = "found_items";

/// Main module struct with DDD-light layout
#[derive(Default)]
pub struct FoundItems {
    // Keep the domain service behind ArcSwap for cheap read-mostly access.
    service: ArcSwapOption<Service>,
    config: ArcSwapOption<FoundItemsConfig>,
}

impl FoundItems {
    pub fn new() -> Self {
        Self::default()
    }

    fn require_service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("{MODULE_NAME}: service not initialized"))
    }
}

#[async_trait]
impl Module for FoundItems {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing {} module", MODULE_NAME);

        let cfg: FoundItemsConfig = ctx.module_config()?;
        debug!(
            "Loaded found_items config: default_page_size={}, max_page_size={}",
            cfg.default_page_size, cfg.max_page_size
        );

        let db = ctx
            .db()
            .ok_or_else(|| anyhow::anyhow!("{MODULE_NAME} requires a database"))?;
        let repo = SqlxFoundItemsRepository::new((*db).clone());

        let service = Service::new(
            Arc::new(repo),
            fields::allow_lists(),
            ServiceConfig {
                default_page_size: cfg.default_page_size,
                max_page_size: cfg.max_page_size,
            },
        );

        self.service.store(Some(Arc::new(service)));
        self.config.store(Some(Arc::new(cfg)));
        info!("{} module initialized", MODULE_NAME);
        Ok(())
    }
}

#[async_trait]
impl DbModule for FoundItems {
    async fn migrate(&self, db: &db::DbHandle) -> anyhow::Result<()> {
        info!("Running {} migrations", MODULE_NAME);
        migrations::run(db).await?;
        Ok(())
    }
}

impl RestfulModule for FoundItems {
    fn register_rest(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
        info!("Registering {} REST routes", MODULE_NAME);

        let service = self.require_service()?;
        let context_url = self
            .config
            .load()
            .as_ref()
            .map(|c| c.odata_context_url.clone())
            .unwrap_or_else(|| FoundItemsConfig::default().odata_context_url);

        let router = crate::api::rest::routes::register_routes(router, service.clone())?;
        let router =
            crate::api::odata::register_routes(router, service, ODataSettings { context_url })?;

        info!("{} REST routes registered", MODULE_NAME);
        Ok(router)
    }

    fn openapi(&self) -> Option<utoipa::openapi::OpenApi> {
        Some(FoundItemsApiDoc::openapi())
    }
}
