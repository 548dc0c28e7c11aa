//! Report rendering errors.

use super::error_code::{self, ErrorCode};

/// Errors raised while rendering or writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Unknown report format '{0}'")]
    UnknownFormat(String),

    #[error("Failed to render report: {0}")]
    Render(String),

    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ErrorCode for ReportError {
    fn error_code(&self) -> &'static str {
        error_code::REPORT_ERROR
    }
}
