//! Run-wide settings: timeout, warning budget, worker pool, layer subset.

use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_MAX_WARNINGS;

/// The `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunSettings {
    /// Wall-clock budget for the whole run, in seconds. Default: 300.
    pub timeout_secs: Option<u64>,
    /// Pre-deploy warning threshold. Default: 5.
    pub max_warnings: Option<usize>,
    /// Link-check worker pool size. Default: 8.
    pub workers: Option<usize>,
    /// Subset of layers to run. Empty means all.
    #[serde(default)]
    pub layers: Vec<String>,
}

impl RunSettings {
    pub fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(300)
    }

    pub fn effective_max_warnings(&self) -> usize {
        self.max_warnings.unwrap_or(DEFAULT_MAX_WARNINGS)
    }

    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or(8)
    }
}
