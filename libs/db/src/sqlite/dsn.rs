//! SQLite DSN handling: PRAGMA extraction, in-memory detection, parent dirs.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use super::pragmas::{Pragmas, PRAGMA_KEYS};

/// A SQLite DSN split into what sqlx understands and what we apply ourselves.
#[derive(Clone, Debug)]
pub(crate) struct SqliteDsn {
    /// DSN with PRAGMA keys removed.
    pub clean: String,
    pub pragmas: Pragmas,
    pub in_memory: bool,
}

impl SqliteDsn {
    pub(crate) fn parse(dsn: &str) -> Self {
        let (clean, pairs) = extract_sqlite_pragmas(dsn);
        let in_memory = is_memory_dsn(&clean);
        Self {
            clean,
            pragmas: Pragmas::from_pairs(&pairs),
            in_memory,
        }
    }
}

pub(crate) fn is_sqlite_dsn(dsn: &str) -> bool {
    dsn.trim_start().starts_with("sqlite:")
}

/// Split PRAGMA keys off the DSN query string.
///
/// DSNs that do not parse as URLs are returned unchanged with no pragmas.
pub(crate) fn extract_sqlite_pragmas(dsn: &str) -> (String, HashMap<String, String>) {
    let Ok(mut url) = url::Url::parse(dsn) else {
        return (dsn.to_string(), HashMap::new());
    };
    if url.query().is_none() {
        return (dsn.to_string(), HashMap::new());
    }

    let mut pragmas = HashMap::new();
    let mut rest = Vec::new();
    for (key, value) in url.query_pairs() {
        let key_lower = key.to_lowercase();
        if PRAGMA_KEYS.contains(&key_lower.as_str()) {
            pragmas.insert(key_lower, value.into_owned());
        } else {
            rest.push(format!("{key}={value}"));
        }
    }

    if rest.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&rest.join("&")));
    }
    (url.to_string(), pragmas)
}

/// `sqlite::memory:`, `sqlite://memory:` or any DSN carrying `mode=memory`.
pub(crate) fn is_memory_dsn(dsn: &str) -> bool {
    if dsn == "sqlite::memory:" || dsn == "sqlite://memory:" {
        return true;
    }
    url::Url::parse(dsn)
        .map(|url| {
            url.query_pairs().any(|(k, v)| {
                k.eq_ignore_ascii_case("mode") && v.eq_ignore_ascii_case("memory")
            })
        })
        .unwrap_or(false)
}

/// Create the parent directory of a file-backed database.
pub(crate) fn prepare_sqlite_path(dsn: &str, create_dirs: bool) -> io::Result<()> {
    if !create_dirs || is_memory_dsn(dsn) {
        return Ok(());
    }
    if let Some(parent) = file_path_from_dsn(dsn).as_deref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn file_path_from_dsn(dsn: &str) -> Option<PathBuf> {
    if dsn.contains(":memory:") || dsn.contains("mode=memory") {
        return None;
    }

    let rest = dsn.strip_prefix("sqlite:")?;
    let rest = rest.split('?').next().unwrap_or_default();
    // sqlite:///abs/path keeps its leading slash; sqlite://rel/path does not
    let path = match rest.strip_prefix("//") {
        Some(p) => p,
        None => rest,
    };
    if path.is_empty() || path == "/" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
