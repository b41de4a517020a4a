use thiserror::Error as ThisError;

/// Errors raised while translating OData query options.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A `$filter` term names a field outside the filter allow-list.
    #[error("unsupported filter field: {0}")]
    InvalidFilterField(String),

    /// The `$filter` text could not be parsed, or uses a shape we do not translate.
    #[error("invalid $filter: {0}")]
    InvalidFilter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
