//! Markdown report.

use std::fmt::Write as _;

use sitegate_core::errors::ReportError;
use sitegate_core::types::{Finding, Severity};

use super::{ReportView, Reporter};
use crate::orchestrator::RunResult;

/// Human-readable markdown, suitable for a terminal or a CI job summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReporter;

impl TextReporter {
    fn metadata(out: &mut String, result: &RunResult) -> std::fmt::Result {
        writeln!(out, "| | |")?;
        writeln!(out, "|---|---|")?;
        writeln!(out, "| Target | `{}` |", result.target)?;
        writeln!(out, "| Started | {} |", result.started_at.to_rfc3339())?;
        writeln!(out, "| Mode | {} |", result.mode)?;
        writeln!(out, "| Pages scanned | {} |", result.pages_scanned)?;
        writeln!(out, "| Discovery | {} |", result.discovery.as_str())?;
        writeln!(out, "| Duration | {} ms |", result.duration_ms)?;
        let layers: Vec<&str> = result.layers_run.iter().map(|l| l.title()).collect();
        writeln!(out, "| Layers run | {} |", layers.join(", "))?;
        if result.timed_out {
            writeln!(out, "| Timed out | yes |")?;
        }
        Ok(())
    }

    fn layer_table(out: &mut String, result: &RunResult) -> std::fmt::Result {
        writeln!(out, "## Findings by layer\n")?;
        writeln!(out, "| Layer | Critical | High | Medium | Low |")?;
        writeln!(out, "|---|---:|---:|---:|---:|")?;
        for layer in &result.layers_run {
            let c = result.counts_for(*layer);
            writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                layer.title(),
                c.critical,
                c.high,
                c.medium,
                c.low
            )?;
        }
        Ok(())
    }

    fn finding(out: &mut String, finding: &Finding) -> std::fmt::Result {
        writeln!(
            out,
            "- **{}** `{}` {}: {}",
            severity_label(finding.severity()),
            finding.rule_id(),
            finding.location(),
            finding.message()
        )?;
        if let Some(evidence) = finding.evidence() {
            writeln!(out, "  - evidence: `{}`", evidence.replace('`', "'"))?;
        }
        Ok(())
    }

    fn render(result: &RunResult, view: ReportView) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "# sitegate report\n")?;
        Self::metadata(&mut out, result)?;
        writeln!(out)?;
        Self::layer_table(&mut out, result)?;

        if view != ReportView::Summary {
            for layer in &result.layers_run {
                writeln!(out, "\n## {}\n", layer.title())?;
                let mut shown = 0;
                for finding in result.findings_for(*layer).filter(|f| view.shows(f)) {
                    Self::finding(&mut out, finding)?;
                    shown += 1;
                }
                if shown == 0 {
                    let empty = if view == ReportView::CriticalOnly {
                        "No critical findings."
                    } else {
                        "No findings."
                    };
                    writeln!(out, "{empty}")?;
                }
            }
        }

        let c = &result.counts;
        writeln!(out, "\n## Summary\n")?;
        writeln!(
            out,
            "{} critical, {} high, {} medium, {} low ({} total)\n",
            c.critical,
            c.high,
            c.medium,
            c.low,
            c.total()
        )?;
        let verdict = if result.exit_status.is_success() {
            "PASS"
        } else {
            "FAIL"
        };
        writeln!(out, "Result: {verdict}, {}", result.exit_status)?;
        Ok(out)
    }
}

impl Reporter for TextReporter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn generate(&self, result: &RunResult, view: ReportView) -> Result<String, ReportError> {
        Self::render(result, view).map_err(|e| ReportError::Render(e.to_string()))
    }
}

fn severity_label(severity: Severity) -> String {
    severity.as_str().to_ascii_uppercase()
}
