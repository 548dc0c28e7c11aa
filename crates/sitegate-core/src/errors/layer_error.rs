//! Diagnostic layer errors. Never fatal: the orchestrator turns them into findings.

use super::error_code::{self, ErrorCode};

/// Errors a diagnostic layer can end with.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LayerError {
    #[error("Pattern {rule} failed to compile: {message}")]
    PatternCompilation { rule: String, message: String },

    #[error("Layer failed: {0}")]
    Failed(String),

    #[error("Layer panicked: {0}")]
    Panicked(String),

    #[error("Layer cancelled before completion")]
    Cancelled,
}

impl ErrorCode for LayerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => error_code::CANCELLED,
            _ => error_code::LAYER_ERROR,
        }
    }
}
