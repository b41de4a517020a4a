//! HTTP-facing helpers shared by modules: problem responses and OData options.

pub mod odata;
pub mod problem;

pub use odata::{odata_error_to_problem, OData, ODataParams};
pub use problem::{Problem, ProblemResponse, ValidationError};
