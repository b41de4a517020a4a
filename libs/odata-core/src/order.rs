use std::fmt;

use crate::allow_list::AllowList;

/// Column used when `$orderby` is absent or names an unknown field.
pub const DEFAULT_ORDER_COLUMN: &str = "created_at";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// A single resolved sort key. The column always comes from an allow-list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderSpec {
    column: String,
    dir: SortDir,
}

impl OrderSpec {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn dir(&self) -> SortDir {
        self.dir
    }

    /// `"<column> ASC"` or `"<column> DESC"`.
    pub fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.dir.as_sql())
    }
}

impl Default for OrderSpec {
    fn default() -> Self {
        Self {
            column: DEFAULT_ORDER_COLUMN.to_owned(),
            dir: SortDir::Desc,
        }
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.dir.as_sql())
    }
}

/// Resolve `$orderby` into a single sort key. Never fails: blank input or an
/// unknown field yields [`OrderSpec::default`].
pub fn parse_orderby(raw: &str, allow: &AllowList) -> OrderSpec {
    let raw = raw.trim();
    if raw.is_empty() {
        return OrderSpec::default();
    }

    let (field, dir_token) = match raw.split_once(char::is_whitespace) {
        Some((field, rest)) => (field, rest.trim()),
        None => (raw, ""),
    };

    let Some(column) = allow.column(field) else {
        return OrderSpec::default();
    };

    let dir = if dir_token.eq_ignore_ascii_case("desc") {
        SortDir::Desc
    } else {
        SortDir::Asc
    };

    OrderSpec {
        column: column.to_owned(),
        dir,
    }
}
