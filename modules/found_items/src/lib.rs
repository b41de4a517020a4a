//! Found items module: the municipal lost & found registry.
//!
//! Layout follows the modkit convention:
//! - `contract` - plain domain models, no serde
//! - `domain` - business rules and the repository port
//! - `infra` - sqlx-backed storage
//! - `api` - REST and OData transports, OpenAPI document

// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model;

// === MODULE DEFINITION ===
pub mod config;
pub mod module;
pub use module::FoundItems;

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
