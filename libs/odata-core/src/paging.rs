//! Tolerant parsing of paging options.
//!
//! Paging input is never an error: malformed or out-of-range values fall back
//! to defaults or are clamped.

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page size bounds, usually taken from module configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: i64,
    pub max_size: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    pub fn new(default_size: i64, max_size: i64) -> Self {
        let max_size = max_size.max(1);
        Self {
            default_size: default_size.clamp(1, max_size),
            max_size,
        }
    }
}

/// Resolved `$skip` / `$top` / `$count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ODataPaging {
    pub skip: i64,
    pub top: i64,
    pub count: bool,
}

impl ODataPaging {
    /// - `$skip`: negative or unparsable → 0
    /// - `$top`: absent, unparsable or ≤ 0 → default; above max → max
    /// - `$count`: `1|t|T|true|TRUE|True` → true, anything else → false
    pub fn parse(
        skip: Option<&str>,
        top: Option<&str>,
        count: Option<&str>,
        limits: PageLimits,
    ) -> Self {
        let skip = parse_int(skip).unwrap_or(0).max(0);
        let top = match parse_int(top) {
            Some(n) if n > 0 => n.min(limits.max_size),
            _ => limits.default_size,
        };
        Self {
            skip,
            top,
            count: count.is_some_and(parse_bool),
        }
    }
}

impl Default for ODataPaging {
    fn default() -> Self {
        Self::parse(None, None, None, PageLimits::default())
    }
}

/// Resolved REST `skip` / `limit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestPaging {
    pub skip: i64,
    pub limit: i64,
}

impl RestPaging {
    /// `limit` defaults only when absent. A present but unparsable or empty
    /// value reads as 0, and the result is clamped to `[1, max]`. `skip` is
    /// floored at 0.
    pub fn parse(skip: Option<&str>, limit: Option<&str>, limits: PageLimits) -> Self {
        let skip = parse_int(skip).unwrap_or(0).max(0);
        let limit = match limit {
            None => limits.default_size,
            raw => parse_int(raw).unwrap_or(0),
        }
        .clamp(1, limits.max_size);
        Self { skip, limit }
    }
}

impl Default for RestPaging {
    fn default() -> Self {
        Self::parse(None, None, PageLimits::default())
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "t" | "T" | "true" | "TRUE" | "True")
}
