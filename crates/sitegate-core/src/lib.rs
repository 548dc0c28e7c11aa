//! sitegate-core: shared foundation of the sitegate site validation engine.
//!
//! Holds the finding model, severity and exit-status rules, the run
//! configuration and its TOML resolution, the error taxonomy, the
//! cancellation token, and tracing setup. Every other crate depends on this
//! one; it depends on nothing internal.

pub mod config;
pub mod errors;
pub mod tracing_setup;
pub mod traits;
pub mod types;
