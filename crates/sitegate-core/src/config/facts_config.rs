//! Reference fact sheet configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The `[facts]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FactsConfig {
    /// Path to the fact sheet.
    pub sheet: Option<PathBuf>,
    /// Fail with exit 5 when no fact sheet is configured. Default: false.
    pub required: Option<bool>,
}

impl FactsConfig {
    pub fn effective_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}
