//! Run lifecycle states.

use std::fmt;

use serde::Serialize;

/// Where a run is in its lifecycle. States only ever advance one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Fetching,
    Scanning,
    Aggregating,
    Reported,
}

impl RunState {
    /// The only state this one may advance to.
    pub fn successor(self) -> Option<RunState> {
        match self {
            Self::Pending => Some(Self::Fetching),
            Self::Fetching => Some(Self::Scanning),
            Self::Scanning => Some(Self::Aggregating),
            Self::Aggregating => Some(Self::Reported),
            Self::Reported => None,
        }
    }

    pub fn can_advance_to(self, next: RunState) -> bool {
        self.successor() == Some(next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Scanning => "scanning",
            Self::Aggregating => "aggregating",
            Self::Reported => "reported",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
