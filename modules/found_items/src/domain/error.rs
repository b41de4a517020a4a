use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Found item not found: {id}")]
    ItemNotFound { id: String },

    #[error("Found item '{id}' already exists")]
    ItemAlreadyExists { id: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Query(#[from] odata_core::Error),

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn item_not_found(id: impl Into<String>) -> Self {
        Self::ItemNotFound { id: id.into() }
    }

    pub fn item_already_exists(id: impl Into<String>) -> Self {
        Self::ItemAlreadyExists { id: id.into() }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Store failure with its whole context chain, e.g.
    /// `list failed: select found items failed: error returned from database: ...`.
    pub fn store(err: anyhow::Error) -> Self {
        Self::database(format!("{err:#}"))
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
