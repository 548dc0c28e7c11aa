//! The finding model: one anomaly reported by one layer.

use std::fmt;

use serde::Serialize;
use xxhash_rust::xxh3::xxh3_64;

use super::{LayerId, Severity};

/// Longest evidence excerpt kept on a finding, in characters.
pub const MAX_EVIDENCE_CHARS: usize = 120;

/// Where a finding occurs: a page plus an optional 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl Location {
    /// A location covering a whole page.
    pub fn page(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            line: None,
            column: None,
        }
    }

    /// A location at a line and column of a page.
    pub fn at(page: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            page: page.into(),
            line: Some(line),
            column: Some(column),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, "{}:{line}:{col}", self.page),
            (Some(line), None) => write!(f, "{}:{line}", self.page),
            _ => f.write_str(&self.page),
        }
    }
}

/// One detected anomaly.
///
/// Fields are private: a finding belongs to exactly one layer, always has a
/// message, and its severity cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    layer: LayerId,
    severity: Severity,
    rule_id: String,
    location: Location,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    evidence: Option<String>,
}

impl Finding {
    /// Create a finding. An empty message falls back to the rule id.
    pub fn new(
        layer: LayerId,
        severity: Severity,
        rule_id: impl Into<String>,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        let rule_id = rule_id.into();
        let mut message = message.into();
        if message.trim().is_empty() {
            message = rule_id.clone();
        }
        Self {
            layer,
            severity,
            rule_id,
            location,
            message,
            evidence: None,
        }
    }

    /// Attach an evidence excerpt. Whitespace is collapsed and the text is
    /// cut to [`MAX_EVIDENCE_CHARS`].
    pub fn with_evidence(mut self, evidence: impl AsRef<str>) -> Self {
        let collapsed = collapse_whitespace(evidence.as_ref());
        if !collapsed.is_empty() {
            self.evidence = Some(truncate_chars(&collapsed, MAX_EVIDENCE_CHARS));
        }
        self
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn evidence(&self) -> Option<&str> {
        self.evidence.as_deref()
    }

    /// Stable identity of the finding across runs, as 16 hex digits.
    pub fn fingerprint(&self) -> String {
        let key = format!(
            "{}|{}|{}|{}",
            self.layer,
            self.rule_id,
            self.location,
            self.evidence.as_deref().unwrap_or_default()
        );
        format!("{:016x}", xxh3_64(key.as_bytes()))
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
