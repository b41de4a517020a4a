use async_trait::async_trait;
use axum::Router;

use crate::context::ModuleCtx;

/// Core module: DI/wiring; do not rely on migrated schema here.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()>;
}

#[async_trait]
pub trait DbModule: Send + Sync {
    /// Runs AFTER init, BEFORE REST registration.
    async fn migrate(&self, db: &db::DbHandle) -> anyhow::Result<()>;
}

/// Pure wiring; must be sync. Runs AFTER DB migrations.
pub trait RestfulModule: Send + Sync {
    fn register_rest(&self, ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router>;

    /// Paths and schemas this module serves, merged into the host document.
    fn openapi(&self) -> Option<utoipa::openapi::OpenApi> {
        None
    }
}

/// Owns the listener: prepares the base router before modules register and
/// finalizes it (documents, middleware) afterwards. Does not serve.
pub trait RestHostModule: Send + Sync + 'static {
    fn rest_prepare(&self, ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router>;

    fn rest_finalize(
        &self,
        ctx: &ModuleCtx,
        router: Router,
        docs: Vec<utoipa::openapi::OpenApi>,
    ) -> anyhow::Result<Router>;
}
