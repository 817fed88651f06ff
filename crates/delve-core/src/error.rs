use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or editing a cave configuration.
///
/// Bad numeric values are not errors; they are corrected by
/// [`crate::config::CaveConfig::sanitize`] and reported as issues.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse cave config RON: {0}")]
    ParseError(String),

    #[error("Unknown config key '{0}'")]
    UnknownKey(String),

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
