//! Shared value types: findings, severities, layers, counts, run modes, exit status.

pub mod counts;
pub mod exit_status;
pub mod finding;
pub mod layer;
pub mod run_mode;
pub mod severity;

pub use counts::SeverityCounts;
pub use exit_status::ExitStatus;
pub use finding::{Finding, Location};
pub use layer::LayerId;
pub use run_mode::{RunMode, DEFAULT_MAX_WARNINGS};
pub use severity::Severity;
