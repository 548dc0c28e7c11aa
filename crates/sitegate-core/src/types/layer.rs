//! Diagnostic layer identifiers and their fixed execution sequence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a diagnostic layer.
///
/// Declaration order is the fixed aggregation sequence: findings are always
/// reported security first and fact consistency last, whatever order the
/// layers actually finish in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    Security,
    Structural,
    ContentQuality,
    LinkIntegrity,
    FactConsistency,
}

impl LayerId {
    /// Every layer in execution sequence.
    pub const SEQUENCE: [LayerId; 5] = [
        LayerId::Security,
        LayerId::Structural,
        LayerId::ContentQuality,
        LayerId::LinkIntegrity,
        LayerId::FactConsistency,
    ];

    /// Position in the execution sequence.
    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Security => "security",
            Self::Structural => "structural",
            Self::ContentQuality => "content_quality",
            Self::LinkIntegrity => "link_integrity",
            Self::FactConsistency => "fact_consistency",
        }
    }

    /// Human-readable name used in reports.
    pub fn title(self) -> &'static str {
        match self {
            Self::Security => "Security Posture",
            Self::Structural => "Structural Integrity",
            Self::ContentQuality => "Content Quality",
            Self::LinkIntegrity => "Link Integrity",
            Self::FactConsistency => "Fact Consistency",
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "security" => Ok(Self::Security),
            "structural" | "structure" => Ok(Self::Structural),
            "content_quality" | "content" => Ok(Self::ContentQuality),
            "link_integrity" | "links" => Ok(Self::LinkIntegrity),
            "fact_consistency" | "facts" => Ok(Self::FactConsistency),
            _ => Err(format!("unknown layer '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_matches_sequence() {
        for (i, layer) in LayerId::SEQUENCE.iter().enumerate() {
            assert_eq!(layer.rank(), i);
        }
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("links".parse::<LayerId>().unwrap(), LayerId::LinkIntegrity);
        assert_eq!("content-quality".parse::<LayerId>().unwrap(), LayerId::ContentQuality);
        assert!("performance".parse::<LayerId>().is_err());
    }
}
