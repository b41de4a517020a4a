use serde::{Deserialize, Serialize};

/// Configuration for the found_items module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FoundItemsConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
    /// Value of `odata.context` in OData responses.
    #[serde(default = "default_odata_context_url")]
    pub odata_context_url: String,
}

impl Default for FoundItemsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            odata_context_url: default_odata_context_url(),
        }
    }
}

fn default_page_size() -> i64 {
    odata_core::paging::DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> i64 {
    odata_core::paging::MAX_PAGE_SIZE
}

fn default_odata_context_url() -> String {
    "https://api.zguba.gov/odata/$metadata".to_owned()
}
