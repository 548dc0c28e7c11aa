//! JSON report.

use std::collections::BTreeMap;

use serde::Serialize;
use sitegate_core::errors::ReportError;
use sitegate_core::types::{ExitStatus, Finding, LayerId, RunMode, SeverityCounts};

use super::{ReportView, Reporter};
use crate::fetcher::Discovery;
use crate::orchestrator::RunResult;

/// Machine-readable report with the same content as the text report.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReporter;

#[derive(Serialize)]
struct JsonReport<'a> {
    tool: &'static str,
    version: &'static str,
    view: ReportView,
    target: &'a str,
    mode: RunMode,
    started_at: String,
    duration_ms: u64,
    pages_scanned: usize,
    discovery: Discovery,
    layers_run: &'a [LayerId],
    counts: SeverityCounts,
    layer_counts: &'a BTreeMap<LayerId, SeverityCounts>,
    exit_status: ExitStatus,
    exit_code: i32,
    passed: bool,
    timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    findings: Option<Vec<JsonFinding<'a>>>,
}

#[derive(Serialize)]
struct JsonFinding<'a> {
    #[serde(flatten)]
    finding: &'a Finding,
    fingerprint: String,
}

impl Reporter for JsonReporter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn generate(&self, result: &RunResult, view: ReportView) -> Result<String, ReportError> {
        let findings = (view != ReportView::Summary).then(|| {
            result
                .findings
                .iter()
                .filter(|f| view.shows(f))
                .map(|finding| JsonFinding {
                    finding,
                    fingerprint: finding.fingerprint(),
                })
                .collect()
        });
        let report = JsonReport {
            tool: "sitegate",
            version: env!("CARGO_PKG_VERSION"),
            view,
            target: &result.target,
            mode: result.mode,
            started_at: result.started_at.to_rfc3339(),
            duration_ms: result.duration_ms,
            pages_scanned: result.pages_scanned,
            discovery: result.discovery,
            layers_run: &result.layers_run,
            counts: result.counts,
            layer_counts: &result.layer_counts,
            exit_status: result.exit_status,
            exit_code: result.exit_code(),
            passed: result.exit_status.is_success(),
            timed_out: result.timed_out,
            findings,
        };
        serde_json::to_string_pretty(&report).map_err(|e| ReportError::Render(e.to_string()))
    }
}
