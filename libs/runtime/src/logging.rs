use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_MAX_SIZE_MB: u64 = 100;

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

type SubsystemFilter =
    FilterFn<Box<dyn Fn(&tracing::Metadata<'_>) -> bool + Send + Sync + 'static>>;

/// Pass everything at or below `max_level` that no named subsystem claims.
fn unclaimed_targets_filter(subsystems: &[String], max_level: Level) -> SubsystemFilter {
    let subsystems = subsystems.to_vec();
    FilterFn::new(Box::new(move |meta: &tracing::Metadata<'_>| {
        let t = meta.target();
        if subsystems.iter().any(|s| matches_target_prefix(t, s)) {
            return false;
        }
        meta.level() <= &max_level
    }))
}

/// `target == name` or `target` starts with `name::`.
fn matches_target_prefix(target: &str, name: &str) -> bool {
    target == name || (target.starts_with(name) && target[name.len()..].starts_with("::"))
}

// -------- rotating file sinks --------

type SharedRotate = Arc<Mutex<FileRotate<AppendTimestamp>>>;

#[derive(Clone)]
struct RotWriter(SharedRotate);

impl<'a> fmt::MakeWriter<'a> for RotWriter {
    type Writer = RotWriterHandle;
    fn make_writer(&'a self) -> Self::Writer {
        RotWriterHandle(Some(self.0.clone()))
    }
}

/// Handle to an optional sink; writes to `None` are dropped.
#[derive(Clone)]
struct RotWriterHandle(Option<SharedRotate>);

fn poisoned() -> std::io::Error {
    std::io::Error::other("log file writer lock poisoned")
}

impl Write for RotWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.0 {
            Some(rot) => rot.lock().map_err(|_| poisoned())?.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.0 {
            Some(rot) => rot.lock().map_err(|_| poisoned())?.flush(),
            None => Ok(()),
        }
    }
}

/// Routes records to per-subsystem files by target prefix, falling back to
/// the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: HashMap<String, RotWriter>,
}

impl FileRouter {
    fn resolve_for(&self, target: &str) -> Option<SharedRotate> {
        self.by_prefix
            .iter()
            .find(|(name, _)| matches_target_prefix(target, name))
            .map(|(_, w)| w.0.clone())
            .or_else(|| self.default.as_ref().map(|w| w.0.clone()))
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RotWriterHandle;

    fn make_writer(&'a self) -> Self::Writer {
        RotWriterHandle(self.default.as_ref().map(|w| w.0.clone()))
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RotWriterHandle(self.resolve_for(meta.target()))
    }
}

struct Sections<'a> {
    default: Option<&'a Section>,
    subsystems: Vec<(String, &'a Section)>,
    names: Vec<String>,
}

fn split_sections(cfg: &LoggingConfig) -> Sections<'_> {
    let subsystems = cfg
        .iter()
        .filter(|(k, _)| k.as_str() != "default")
        .map(|(k, v)| (k.clone(), v))
        .collect::<Vec<_>>();
    let names = subsystems.iter().map(|(n, _)| n.clone()).collect();

    Sections {
        default: cfg.get("default"),
        subsystems,
        names,
    }
}

/// Relative log paths live under `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// Retention: a backup count wins over an age limit; one day of files otherwise.
fn file_limit(section: &Section) -> FileLimit {
    match (section.max_backups, section.max_age_days) {
        (Some(n), _) => FileLimit::MaxFiles(n.max(1)),
        (None, Some(days)) => FileLimit::Age(chrono::Duration::days(i64::from(days.max(1)))),
        (None, None) => FileLimit::Age(chrono::Duration::days(1)),
    }
}

fn create_rotating_writer_at_path(
    log_path: &Path,
    max_bytes: usize,
    limit: FileLimit,
) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn file_writer_for(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let log_path = resolve_log_path(&section.file, base_dir);

    match create_rotating_writer_at_path(&log_path, max_bytes as usize, file_limit(section)) {
        Ok(writer) => Some(writer),
        Err(e) => {
            // The subscriber is not installed yet.
            eprintln!(
                "Failed to init log file for '{}': {} ({})",
                name,
                log_path.to_string_lossy(),
                e
            );
            None
        }
    }
}

/// Install the global subscriber.
///
/// Each non-`default` key names a target prefix (`found_items`, `api_ingress`,
/// `tower_http`, ...) with its own console level and optional JSON file sink.
/// The `default` section covers every target no other section claims.
/// Relative file paths are resolved against `base_dir`, usually `server.home_dir`.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // `log` records from sqlx and friends go through tracing.
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    let sections = split_sections(cfg);
    let console_targets = console_targets(&sections);
    let file_targets = file_targets(&sections);
    let router = file_router(&sections, base_dir);

    install_layers(&sections, console_targets, file_targets, router);
}

fn init_default_logging() {
    let _ = fmt()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

fn console_targets(sections: &Sections) -> Targets {
    let mut targets = Targets::new().with_default(LevelFilter::OFF);
    for (name, section) in &sections.subsystems {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            targets = targets.with_target(name.clone(), LevelFilter::from_level(level));
        }
    }
    targets
}

fn file_targets(sections: &Sections) -> Targets {
    let mut targets = Targets::new().with_default(LevelFilter::OFF);
    for (name, section) in &sections.subsystems {
        if section.file.trim().is_empty() {
            continue;
        }
        if let Some(level) = parse_tracing_level(&section.file_level) {
            targets = targets.with_target(name.clone(), LevelFilter::from_level(level));
        }
    }
    targets
}

fn file_router(sections: &Sections, base_dir: &Path) -> FileRouter {
    let mut router = FileRouter {
        default: sections
            .default
            .and_then(|s| file_writer_for("default", s, base_dir)),
        by_prefix: HashMap::new(),
    };

    for (name, section) in &sections.subsystems {
        if let Some(writer) = file_writer_for(name, section, base_dir) {
            router.by_prefix.insert(name.clone(), writer);
        }
    }

    router
}

fn install_layers(
    sections: &Sections,
    console_targets: Targets,
    file_targets: Targets,
    router: FileRouter,
) {
    use tracing_subscriber::{layer::SubscriberExt, prelude::*, Layer, Registry};

    let ansi = std::io::stdout().is_terminal();

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    layers.push(
        fmt::layer()
            .with_ansi(ansi)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_filter(console_targets)
            .boxed(),
    );

    if !router.is_empty() {
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router.clone())
                .with_filter(file_targets)
                .boxed(),
        );
    }

    if let Some(default) = sections.default {
        if let Some(level) = parse_tracing_level(&default.console_level) {
            layers.push(
                fmt::layer()
                    .with_ansi(ansi)
                    .with_target(true)
                    .with_level(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_filter(unclaimed_targets_filter(&sections.names, level))
                    .boxed(),
            );
        }

        if router.default.is_some() {
            if let Some(level) = parse_tracing_level(&default.file_level) {
                layers.push(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_target(true)
                        .with_level(true)
                        .with_timer(fmt::time::UtcTime::rfc_3339())
                        .with_writer(router)
                        .with_filter(unclaimed_targets_filter(&sections.names, level))
                        .boxed(),
                );
            }
        }
    }

    let _ = Registry::default().with(layers).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(file: &str) -> Section {
        Section {
            console_level: "info".into(),
            file: file.into(),
            file_level: "debug".into(),
            max_age_days: None,
            max_backups: None,
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn test_logging_level_parsing() {
        assert_eq!(parse_tracing_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_tracing_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_tracing_level("Warn"), Some(Level::WARN));
        assert_eq!(parse_tracing_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_tracing_level("off"), None);
        assert_eq!(parse_tracing_level("none"), None);
        assert_eq!(parse_tracing_level("loud"), Some(Level::INFO));
    }

    #[test]
    fn test_target_prefix_matching() {
        assert!(matches_target_prefix("found_items", "found_items"));
        assert!(matches_target_prefix("found_items::domain::service", "found_items"));
        assert!(!matches_target_prefix("found_items_extra", "found_items"));
        assert!(!matches_target_prefix("api_ingress", "found_items"));
    }

    #[test]
    fn test_split_sections() {
        let mut cfg = default_logging_config();
        cfg.insert("found_items".into(), section("logs/found_items.log"));

        let sections = split_sections(&cfg);
        assert!(sections.default.is_some());
        assert_eq!(sections.subsystems.len(), 1);
        assert_eq!(sections.names, vec!["found_items".to_string()]);
    }

    #[test]
    fn test_file_paths_resolved_against_home_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/zguba.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/zguba.log"));

        let abs = tmp.path().join("elsewhere.log");
        assert_eq!(
            resolve_log_path(abs.to_str().unwrap(), Path::new("/unused")),
            abs
        );
    }

    #[test]
    fn test_file_limit_prefers_backups() {
        let mut s = section("x.log");
        s.max_backups = Some(3);
        s.max_age_days = Some(7);
        assert!(matches!(file_limit(&s), FileLimit::MaxFiles(3)));

        s.max_backups = None;
        assert!(matches!(file_limit(&s), FileLimit::Age(d) if d.num_days() == 7));
    }

    #[test]
    fn test_router_routes_by_prefix() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("logs/zguba.log"));
        cfg.insert("api_ingress".into(), section("logs/api.log"));

        let sections = split_sections(&cfg);
        let router = file_router(&sections, tmp.path());
        assert!(!router.is_empty());

        let api = router.resolve_for("api_ingress::router").unwrap();
        let other = router.resolve_for("found_items").unwrap();
        assert!(!Arc::ptr_eq(&api, &other));
        assert!(tmp.path().join("logs").is_dir());
    }

    #[test]
    fn test_empty_file_disables_sink() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section(""));

        let router = file_router(&split_sections(&cfg), tmp.path());
        assert!(router.is_empty());

        let mut handle = RotWriterHandle(None);
        assert_eq!(handle.write(b"dropped").unwrap(), 7);
    }
}
