//! Content fetcher configuration.

use serde::{Deserialize, Serialize};

/// Page extensions collected from a filesystem target by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "php"];

/// The `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of pages enumerated. Default: 200.
    pub max_pages: Option<usize>,
    /// Per-request timeout in seconds. Default: 15.
    pub request_timeout_secs: Option<u64>,
    /// Retries for transient transport errors. Default: 1.
    pub max_retries: Option<u32>,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
    /// File extensions treated as pages on a filesystem target.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Public URL of a filesystem target; absolute links to this origin are
    /// resolved inside the local tree.
    pub base_url: Option<String>,
}

impl FetchConfig {
    pub fn effective_max_pages(&self) -> usize {
        self.max_pages.unwrap_or(200)
    }

    pub fn effective_request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs.unwrap_or(15)
    }

    pub fn effective_max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(1)
    }

    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("sitegate/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Lowercased extensions without a leading dot.
    pub fn effective_extensions(&self) -> Vec<String> {
        if self.extensions.is_empty() {
            return DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        }
        self.extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }
}
