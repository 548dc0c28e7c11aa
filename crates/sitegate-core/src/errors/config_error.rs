//! Configuration and command-line errors.

use super::error_code::{self, ErrorCode};

/// Errors raised while resolving the run configuration. Always fatal (exit 3).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Invalid value for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Conflicting flags: {0}")]
    ConflictingFlags(String),

    #[error("Missing target: pass a site directory, page file, or http(s) URL")]
    MissingTarget,

    #[error("Invalid target '{target}': {message}")]
    InvalidTarget { target: String, message: String },

    #[error("{0}")]
    InvalidArguments(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }
}
