//! Run modes selected on the command line.

use std::fmt;

use serde::Serialize;

/// Default pre-deploy warning threshold.
pub const DEFAULT_MAX_WARNINGS: usize = 5;

/// How a run reports and how strictly it gates.
///
/// `PreDeploy` carries its warning threshold so that the exit status stays a
/// pure function of the counts and the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum RunMode {
    Normal,
    PreDeploy { max_warnings: usize },
    Quiet,
    Summary,
    CriticalOnly,
}

impl RunMode {
    pub fn pre_deploy() -> Self {
        Self::PreDeploy {
            max_warnings: DEFAULT_MAX_WARNINGS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::PreDeploy { .. } => "pre_deploy",
            Self::Quiet => "quiet",
            Self::Summary => "summary",
            Self::CriticalOnly => "critical_only",
        }
    }
}

impl Default for RunMode {
    fn default() -> Self {
        Self::Normal
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreDeploy { max_warnings } => {
                write!(f, "pre_deploy (max warnings {max_warnings})")
            }
            other => f.write_str(other.as_str()),
        }
    }
}
