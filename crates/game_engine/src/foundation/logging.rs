//! Logging utilities

pub use log::{debug, error, info, trace, warn};

use crate::config::LoggingConfig;

/// Initialize the logging system
///
/// The configured filter is applied first and `RUST_LOG` is layered on top,
/// so the environment always wins. Calling this more than once is harmless:
/// only the first call installs a logger.
pub fn init(config: &LoggingConfig) {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&config.filter);
    builder.parse_env("RUST_LOG");
    if !config.timestamps {
        builder.format_timestamp(None);
    }

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}

/// Initialize logging with the default configuration
pub fn init_default() {
    init(&LoggingConfig::default());
}
