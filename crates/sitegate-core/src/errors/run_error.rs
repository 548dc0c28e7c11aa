//! Fatal run errors and their exit statuses.

use super::error_code::ErrorCode;
use super::{ConfigError, FactStoreError, FetchError, ReportError};
use crate::types::ExitStatus;

/// Errors that abort a run before or after scanning.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum SiteGateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Fact sheet error: {0}")]
    FactStore(#[from] FactStoreError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

impl SiteGateError {
    /// The process exit status this error maps to.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Config(_) | Self::Report(_) => ExitStatus::ConfigError,
            Self::Fetch(_) => ExitStatus::Unreachable,
            Self::FactStore(_) => ExitStatus::MissingIntegration,
        }
    }
}

impl ErrorCode for SiteGateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Fetch(e) => e.error_code(),
            Self::FactStore(e) => e.error_code(),
            Self::Report(e) => e.error_code(),
        }
    }
}
