//! Reporters: render a [`RunResult`] for people or machines.
//!
//! Two formats: markdown text (the default) and JSON.

pub mod json;
pub mod text;

use serde::Serialize;
use sitegate_core::errors::ReportError;
use sitegate_core::types::{Finding, RunMode, Severity};

use crate::orchestrator::RunResult;

/// How much of a result a report shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportView {
    /// Every finding.
    Full,
    /// Counts only.
    Summary,
    /// Critical findings only.
    CriticalOnly,
}

impl ReportView {
    pub fn for_mode(mode: RunMode) -> Self {
        match mode {
            RunMode::Summary => Self::Summary,
            RunMode::CriticalOnly => Self::CriticalOnly,
            _ => Self::Full,
        }
    }

    /// Whether `finding` is listed in this view.
    pub fn shows(self, finding: &Finding) -> bool {
        match self {
            Self::Full => true,
            Self::Summary => false,
            Self::CriticalOnly => finding.severity() == Severity::Critical,
        }
    }
}

/// Trait for report generation.
pub trait Reporter: Send + Sync {
    fn name(&self) -> &'static str;
    fn generate(&self, result: &RunResult, view: ReportView) -> Result<String, ReportError>;
}

/// Create a reporter by format name.
pub fn create_reporter(format: &str) -> Option<Box<dyn Reporter>> {
    match format {
        "text" | "markdown" | "md" => Some(Box::new(text::TextReporter)),
        "json" => Some(Box::new(json::JsonReporter)),
        _ => None,
    }
}

/// List all available reporter format names.
pub fn available_formats() -> &'static [&'static str] {
    &["text", "json"]
}

/// The one-line verdict printed in quiet mode.
pub fn status_line(result: &RunResult) -> String {
    let verdict = if result.exit_status.is_success() {
        "PASS"
    } else {
        "FAIL"
    };
    let c = &result.counts;
    format!(
        "sitegate: {verdict} exit={} critical={} high={} medium={} low={}",
        result.exit_code(),
        c.critical,
        c.high,
        c.medium,
        c.low
    )
}
