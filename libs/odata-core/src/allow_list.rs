use std::collections::HashMap;

/// Maps externally visible field names to storage column names.
///
/// Keys are stored lowercased so lookups are case-insensitive. The table is
/// built once and only read afterwards.
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    map: HashMap<String, String>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn insert(mut self, api_name: impl Into<String>, column: impl Into<String>) -> Self {
        self.map
            .insert(api_name.into().to_lowercase(), column.into());
        self
    }

    /// Column for an external field name, if allowed.
    pub fn column(&self, api_name: &str) -> Option<&str> {
        self.map
            .get(&api_name.to_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, api_name: &str) -> bool {
        self.column(api_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for AllowList
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(AllowList::new(), |acc, (k, v)| acc.insert(k, v))
    }
}

/// The pair of independent tables a queryable resource exposes.
#[derive(Clone, Debug, Default)]
pub struct QueryAllowLists {
    pub filter: AllowList,
    pub order: AllowList,
}

impl QueryAllowLists {
    pub fn new(filter: AllowList, order: AllowList) -> Self {
        Self { filter, order }
    }
}
