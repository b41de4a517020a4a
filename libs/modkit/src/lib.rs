//! # ModKit
//!
//! Shared building blocks for registry modules: the module lifecycle
//! contracts (`init` → `migrate` → REST registration), RFC 9457 problem
//! responses, the OData query-option extractor and the mapping of OData
//! translation errors onto problems.

pub mod api;
pub mod context;
pub mod contracts;

pub use api::odata::{OData, ODataParams};
pub use api::problem::{
    bad_request, conflict, internal_error, not_found, Problem, ProblemResponse, ValidationError,
};
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};
pub use contracts::{DbModule, Module, RestHostModule, RestfulModule};
