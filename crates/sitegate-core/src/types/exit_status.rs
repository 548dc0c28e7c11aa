//! Process exit status, the automation contract consumed by CI.

use std::fmt;

use serde::Serialize;

use super::{RunMode, SeverityCounts};

/// Outcome of a run as a process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    /// No critical or high findings (exit 0).
    Clean,
    /// A critical finding, or the pre-deploy warning budget exceeded (exit 1).
    Blocked,
    /// High findings without any critical one (exit 2).
    Findings,
    /// Invalid command line or configuration (exit 3).
    ConfigError,
    /// Target unreachable or empty (exit 4).
    Unreachable,
    /// A required external input such as the fact sheet is missing (exit 5).
    MissingIntegration,
}

impl ExitStatus {
    /// Derive the status of a completed scan.
    ///
    /// Pure function of the counts and the mode: identical inputs always
    /// produce the same status.
    pub fn from_counts(counts: &SeverityCounts, mode: RunMode) -> Self {
        if counts.critical > 0 {
            return Self::Blocked;
        }
        match mode {
            RunMode::CriticalOnly => Self::Clean,
            RunMode::PreDeploy { max_warnings } if counts.warnings() > max_warnings => {
                Self::Blocked
            }
            _ if counts.high > 0 => Self::Findings,
            _ => Self::Clean,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Blocked => 1,
            Self::Findings => 2,
            Self::ConfigError => 3,
            Self::Unreachable => 4,
            Self::MissingIntegration => 5,
        }
    }

    /// Gating strength of a scan outcome: clean < findings < blocked.
    /// Fatal statuses rank above every scan outcome.
    pub fn rank(self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Findings => 1,
            Self::Blocked => 2,
            Self::ConfigError | Self::Unreachable | Self::MissingIntegration => 3,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Clean
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Clean => "clean",
            Self::Blocked => "blocked",
            Self::Findings => "findings",
            Self::ConfigError => "config error",
            Self::Unreachable => "unreachable",
            Self::MissingIntegration => "missing integration",
        };
        write!(f, "{label} (exit {})", self.code())
    }
}
