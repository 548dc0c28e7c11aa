//! The aggregated outcome of one run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sitegate_core::types::{ExitStatus, Finding, LayerId, RunMode, Severity, SeverityCounts};

use crate::fetcher::Discovery;

/// Everything a reporter needs. Built only by the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub target: String,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub pages_scanned: usize,
    pub discovery: Discovery,
    /// Layers that ran, in execution sequence.
    pub layers_run: Vec<LayerId>,
    /// Ordered by layer sequence, then discovery order within a layer.
    pub findings: Vec<Finding>,
    pub counts: SeverityCounts,
    pub layer_counts: BTreeMap<LayerId, SeverityCounts>,
    pub exit_status: ExitStatus,
    /// The run budget elapsed before every layer completed.
    pub timed_out: bool,
}

impl RunResult {
    pub fn exit_code(&self) -> i32 {
        self.exit_status.code()
    }

    pub fn findings_for(&self, layer: LayerId) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(move |f| f.layer() == layer)
    }

    pub fn findings_with(&self, severity: Severity) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(move |f| f.severity() == severity)
    }

    /// Counts for one layer; zero for layers that did not run.
    pub fn counts_for(&self, layer: LayerId) -> SeverityCounts {
        self.layer_counts.get(&layer).copied().unwrap_or_default()
    }
}
