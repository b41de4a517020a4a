//! Process-level plumbing shared by the server binary: layered YAML/env
//! configuration, home directory resolution and tracing setup.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig};
pub use logging::init_logging_from_config;
pub use paths::home_dir::{resolve_home_dir, HomeDirError};
