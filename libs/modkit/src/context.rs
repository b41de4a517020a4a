use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Source of raw per-module configuration sections.
pub trait ConfigProvider: Send + Sync {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

/// What a module sees while it is being wired: its own config section and the
/// shared database handle.
#[derive(Clone, Default)]
pub struct ModuleCtx {
    db: Option<Arc<db::DbHandle>>,
    config_provider: Option<Arc<dyn ConfigProvider>>,
    module_name: Option<Arc<str>>,
}

pub struct ModuleCtxBuilder {
    inner: ModuleCtx,
}

impl ModuleCtxBuilder {
    pub fn new() -> Self {
        Self {
            inner: ModuleCtx::default(),
        }
    }

    pub fn with_db(mut self, db: Arc<db::DbHandle>) -> Self {
        self.inner.db = Some(db);
        self
    }

    pub fn with_config_provider(mut self, p: Arc<dyn ConfigProvider>) -> Self {
        self.inner.config_provider = Some(p);
        self
    }

    pub fn build(self) -> ModuleCtx {
        self.inner
    }
}

impl Default for ModuleCtxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleCtx {
    /// Scope the context to one module so `module_config` reads its section.
    pub fn for_module(mut self, name: &str) -> Self {
        self.module_name = Some(Arc::<str>::from(name));
        self
    }

    pub fn db(&self) -> Option<Arc<db::DbHandle>> {
        self.db.clone()
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    /// Best-effort: a missing section yields `T::default()`.
    /// A present but malformed section is an error.
    pub fn module_config<T: DeserializeOwned + Default>(&self) -> anyhow::Result<T> {
        let raw = match (&self.module_name, &self.config_provider) {
            (Some(name), Some(p)) => p.get_module_config(name),
            _ => None,
        };
        match raw {
            None | Some(serde_json::Value::Null) => Ok(T::default()),
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
                anyhow::anyhow!(
                    "invalid {} config: {e}",
                    self.current_module().unwrap_or("module")
                )
            }),
        }
    }
}
