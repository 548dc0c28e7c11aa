//! Reference fact store errors.

use super::error_code::{self, ErrorCode};

/// Errors raised while loading the reference fact sheet (exit 5).
#[derive(Debug, thiserror::Error)]
pub enum FactStoreError {
    #[error("Fact sheet not found: {path}")]
    Missing { path: String },

    #[error("Fact sheet required but none configured (use --fact-sheet or [facts] sheet)")]
    NotConfigured,

    #[error("Failed to read fact sheet {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ErrorCode for FactStoreError {
    fn error_code(&self) -> &'static str {
        error_code::FACT_STORE_ERROR
    }
}
