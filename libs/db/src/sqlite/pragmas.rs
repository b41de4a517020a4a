//! Typed SQLite PRAGMA settings.
//!
//! Only whitelisted keys are read from the DSN and every value is parsed into an
//! enum or integer, so nothing user-supplied is ever spliced into a PRAGMA
//! statement verbatim.

use std::collections::HashMap;

/// DSN query keys treated as PRAGMA settings (matched lowercased).
pub(crate) const PRAGMA_KEYS: &[&str] = &[
    "wal",
    "synchronous",
    "busy_timeout",
    "journal_mode",
    "foreign_keys",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JournalMode {
    Delete,
    Wal,
    Memory,
    Truncate,
    Persist,
    Off,
}

impl JournalMode {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Wal => "WAL",
            JournalMode::Memory => "MEMORY",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Off => "OFF",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DELETE" => Some(JournalMode::Delete),
            "WAL" => Some(JournalMode::Wal),
            "MEMORY" => Some(JournalMode::Memory),
            "TRUNCATE" => Some(JournalMode::Truncate),
            "PERSIST" => Some(JournalMode::Persist),
            "OFF" => Some(JournalMode::Off),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SyncMode {
    Off,
    Normal,
    Full,
    Extra,
}

impl SyncMode {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            SyncMode::Off => "OFF",
            SyncMode::Normal => "NORMAL",
            SyncMode::Full => "FULL",
            SyncMode::Extra => "EXTRA",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OFF" => Some(SyncMode::Off),
            "NORMAL" => Some(SyncMode::Normal),
            "FULL" => Some(SyncMode::Full),
            "EXTRA" => Some(SyncMode::Extra),
            _ => None,
        }
    }
}

/// PRAGMA overrides found in the DSN. `None` means "use the default".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pragmas {
    pub journal_mode: Option<JournalMode>,
    pub synchronous: Option<SyncMode>,
    pub busy_timeout_ms: Option<u32>,
    pub foreign_keys: Option<bool>,
    /// Legacy `wal=true|false|1|0`.
    pub wal_toggle: Option<bool>,
}

impl Pragmas {
    pub(crate) fn from_pairs(pairs: &HashMap<String, String>) -> Self {
        let mut pragmas = Pragmas::default();

        for (key, value) in pairs {
            match key.to_lowercase().as_str() {
                "journal_mode" => match JournalMode::parse(value) {
                    Some(mode) => pragmas.journal_mode = Some(mode),
                    None => tracing::warn!("Invalid 'journal_mode' PRAGMA value '{}', ignoring", value),
                },
                "synchronous" => match SyncMode::parse(value) {
                    Some(mode) => pragmas.synchronous = Some(mode),
                    None => tracing::warn!("Invalid 'synchronous' PRAGMA value '{}', ignoring", value),
                },
                "busy_timeout" => match value.parse::<u32>() {
                    Ok(ms) => pragmas.busy_timeout_ms = Some(ms),
                    Err(_) => {
                        tracing::warn!("Invalid 'busy_timeout' PRAGMA value '{}', ignoring", value)
                    }
                },
                "foreign_keys" => match parse_flag(value) {
                    Some(on) => pragmas.foreign_keys = Some(on),
                    None => tracing::warn!("Invalid 'foreign_keys' PRAGMA value '{}', ignoring", value),
                },
                "wal" => match parse_flag(value) {
                    Some(on) => pragmas.wal_toggle = Some(on),
                    None => tracing::warn!("Invalid 'wal' PRAGMA value '{}', ignoring", value),
                },
                _ => tracing::debug!("Unknown SQLite PRAGMA parameter: {}", key),
            }
        }

        pragmas
    }

    /// Explicit `journal_mode` wins, then `wal=`, then WAL for files and
    /// DELETE for in-memory databases.
    pub(crate) fn effective_journal_mode(&self, in_memory: bool) -> JournalMode {
        if let Some(mode) = self.journal_mode {
            return mode;
        }
        match self.wal_toggle {
            Some(true) => JournalMode::Wal,
            Some(false) => JournalMode::Delete,
            None if in_memory => JournalMode::Delete,
            None => JournalMode::Wal,
        }
    }

    pub(crate) fn effective_synchronous(&self) -> SyncMode {
        self.synchronous.unwrap_or(SyncMode::Normal)
    }

    pub(crate) fn effective_foreign_keys(&self) -> bool {
        self.foreign_keys.unwrap_or(true)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "on" => Some(true),
        "false" | "0" | "off" => Some(false),
        _ => None,
    }
}
