//! Process-level plumbing shared by the server binary: layered configuration,
//! logging setup, home directory resolution and shutdown signalling.

pub mod config;
pub mod logging;
pub mod paths;
pub mod shutdown;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig};
pub use logging::init_logging_from_config;
pub use shutdown::{cancel_on_shutdown, wait_for_shutdown};
