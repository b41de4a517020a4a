use anyhow::{anyhow, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use axum::Router;
use clap::{Parser, Subcommand};
use db::{ConnectOpts, DbHandle};
use found_items::config::FoundItemsConfig;
use found_items::FoundItems;
use modkit::{DbModule, Module, ModuleCtxBuilder, RestHostModule, RestfulModule};
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

const DEFAULT_DSN: &str = "sqlite://zguba_gov.db";

// Adapter to make AppConfig implement modkit::ConfigProvider
struct ModkitConfigAdapter(AppConfig);

impl modkit::ConfigProvider for ModkitConfigAdapter {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.modules.get(module_name)
    }
}

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Only SQLite is supported; anything else is a configuration error.
fn ensure_sqlite_dsn(cfg: &DatabaseConfig) -> Result<()> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    // "sqlite://:memory:" is not a valid URL, so check the prefix first
    if raw.to_ascii_lowercase().starts_with("sqlite:") {
        return Ok(());
    }
    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;
    Err(anyhow!("Unsupported database type: {}", url.scheme()))
}

fn database_config(config: &AppConfig) -> DatabaseConfig {
    config.database.clone().unwrap_or_else(|| DatabaseConfig {
        url: DEFAULT_DSN.to_string(),
        max_conns: None,
        busy_timeout_ms: None,
    })
}

/// Zguba Server - municipal lost & found registry
#[derive(Parser)]
#[command(name = "zguba-server")]
#[command(about = "Zguba Server - municipal lost & found registry")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::config::default_logging_config);
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Zguba Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config).await,
    }
}

async fn connect_db(db_config: &DatabaseConfig, base_dir: &Path) -> Result<DbHandle> {
    ensure_sqlite_dsn(db_config)?;
    let dsn = absolutize_sqlite_dsn(db_config.url.trim(), base_dir, true)?;

    let connect_opts = ConnectOpts {
        max_conns: db_config.max_conns.or(Some(10)),
        acquire_timeout: Some(Duration::from_secs(5)),
        busy_timeout_ms: db_config
            .busy_timeout_ms
            .unwrap_or(db::DEFAULT_SQLITE_BUSY_TIMEOUT),
        create_sqlite_dirs: true,
        ..Default::default()
    };

    tracing::info!("Connecting to database: {}", dsn);
    let db = DbHandle::connect(&dsn, connect_opts)
        .await
        .with_context(|| format!("Failed to open database {dsn}"))?;
    Ok(db)
}

async fn run_server(config: AppConfig) -> Result<()> {
    let base_dir = PathBuf::from(&config.server.home_dir);
    let db_config = database_config(&config);
    let db = Arc::new(connect_db(&db_config, &base_dir).await?);

    let base_ctx = ModuleCtxBuilder::new()
        .with_db(db.clone())
        .with_config_provider(Arc::new(ModkitConfigAdapter(config.clone())))
        .build();

    let ingress = ApiIngress::default();
    let found_items = FoundItems::new();
    let ingress_ctx = base_ctx.clone().for_module(ingress.name());
    let items_ctx = base_ctx.for_module(found_items.name());

    tracing::info!("Phase: init");
    ingress.init(&ingress_ctx).await?;
    found_items.init(&items_ctx).await?;
    if config.server.timeout_sec > 0 {
        ingress.set_request_timeout(config.server.timeout_sec);
    }

    tracing::info!("Phase: db");
    found_items.migrate(&db).await?;

    tracing::info!("Phase: rest");
    let router = ingress.rest_prepare(&ingress_ctx, Router::new())?;
    let router = found_items.register_rest(&items_ctx, router)?;
    let docs = found_items.openapi().into_iter().collect();
    ingress.rest_finalize(&ingress_ctx, router, docs)?;

    let addr = ingress.resolve_bind_addr(&config.server.host, config.server.port)?;

    let cancel = CancellationToken::new();
    let c = cancel.clone();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(()) => tracing::info!("shutdown: signal received"),
            Err(e) => {
                tracing::warn!(error = %e, "shutdown: primary waiter failed; falling back to ctrl_c()");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
        c.cancel();
    });

    tracing::info!("Phase: serve");
    let served = ingress.serve(addr, cancel).await;

    // Pool clones share one pool, closing any of them closes it for all
    (*db).clone().close().await;
    tracing::info!("Zguba Server stopped");
    served
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

async fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    ensure_sqlite_dsn(&database_config(&config))?;
    let ingress_cfg: ApiIngressConfig = config.module_config(api_ingress::MODULE_NAME)?;
    config.module_config::<FoundItemsConfig>(found_items::module::MODULE_NAME)?;
    ApiIngress::new(ingress_cfg).resolve_bind_addr(&config.server.host, config.server.port)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_dsn_is_kept() {
        let base = Path::new("/srv/zguba");
        assert_eq!(
            absolutize_sqlite_dsn("sqlite::memory:", base, false).unwrap(),
            "sqlite::memory:"
        );
        assert_eq!(
            absolutize_sqlite_dsn("sqlite://:memory:", base, false).unwrap(),
            "sqlite::memory:"
        );
    }

    #[test]
    fn relative_dsn_is_joined_with_home_dir() {
        let dir = tempfile::tempdir().unwrap();
        let dsn = absolutize_sqlite_dsn("sqlite://data/zguba_gov.db?mode=rwc", dir.path(), true)
            .unwrap();
        let expected = dir.path().join("data").join("zguba_gov.db");
        assert_eq!(
            dsn,
            format!("sqlite://{}?mode=rwc", expected.to_string_lossy().replace('\\', "/"))
        );
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn non_sqlite_dsn_is_rejected() {
        let cfg = DatabaseConfig {
            url: "postgresql://localhost/zguba".into(),
            max_conns: None,
            busy_timeout_ms: None,
        };
        let err = ensure_sqlite_dsn(&cfg).unwrap_err();
        assert!(err.to_string().contains("Unsupported database type"));
        assert!(absolutize_sqlite_dsn("zguba.db", Path::new("/tmp"), false).is_err());
    }

    #[test]
    fn modules_see_their_own_section() {
        let mut config = AppConfig::default();
        config
            .modules
            .insert("found_items".into(), serde_json::json!({ "max_page_size": 20 }));
        let adapter = ModkitConfigAdapter(config);
        use modkit::ConfigProvider;
        assert!(adapter.get_module_config("found_items").is_some());
        assert!(adapter.get_module_config("api_ingress").is_none());
    }
}
