//! Per-layer configuration sections.

use serde::{Deserialize, Serialize};

/// The `[security]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Rule ids that never fire, e.g. `security/diagnostic-output`.
    #[serde(default)]
    pub disabled_rules: Vec<String>,
}

impl SecurityConfig {
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        !self.disabled_rules.iter().any(|r| r == rule_id)
    }
}

/// The `[structural]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StructuralConfig {
    /// Tag names checked for balance. Empty means the built-in set.
    #[serde(default)]
    pub tracked_tags: Vec<String>,
}

/// The `[content]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContentConfig {
    /// Placeholder findings per page that carry an evidence snippet. Default: 5.
    pub max_examples: Option<usize>,
}

impl ContentConfig {
    pub fn effective_max_examples(&self) -> usize {
        self.max_examples.unwrap_or(5)
    }
}

/// The `[links]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LinksConfig {
    /// Probe links that leave the site. Default: true.
    pub check_external: Option<bool>,
    /// Crawl depth beyond the enumerated pages. Default: 1.
    pub max_depth: Option<usize>,
}

impl LinksConfig {
    pub fn effective_check_external(&self) -> bool {
        self.check_external.unwrap_or(true)
    }

    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.unwrap_or(1)
    }
}
