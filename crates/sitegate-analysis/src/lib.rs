//! sitegate-analysis: the scanning engine.
//!
//! Fetches a site, runs the diagnostic layers concurrently over the fetched
//! pages, aggregates their findings in a fixed order, and renders reports.

pub mod facts;
pub mod fetcher;
pub mod layers;
pub mod markup;
pub mod orchestrator;
pub mod patterns;
pub mod reporters;

pub use orchestrator::{Orchestrator, RunResult, RunState};
