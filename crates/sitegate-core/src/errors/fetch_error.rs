//! Content fetching errors.

use super::error_code::{self, ErrorCode};

/// Errors raised while loading the target site. Always fatal (exit 4).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Target unreachable: {target} ({reason})")]
    Unreachable { target: String, reason: String },

    #[error("Target has no pages to scan: {target}")]
    Empty { target: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl ErrorCode for FetchError {
    fn error_code(&self) -> &'static str {
        error_code::FETCH_ERROR
    }
}
