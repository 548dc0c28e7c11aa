//! Span definitions per run phase: fetch, layer, probe batch.
//!
//! Each span carries the phase's identifying metadata via the `tracing` crate.

/// Create a span covering site fetching.
#[macro_export]
macro_rules! fetch_span {
    ($target:expr) => {
        tracing::info_span!("sitegate.fetch", target = %$target)
    };
}

/// Create a span covering one diagnostic layer.
#[macro_export]
macro_rules! layer_span {
    ($layer:expr, $pages:expr) => {
        tracing::info_span!("sitegate.layer", layer = %$layer, pages = $pages)
    };
}

/// Create a span covering one level of link probing.
#[macro_export]
macro_rules! probe_span {
    ($depth:expr, $targets:expr) => {
        tracing::debug_span!("sitegate.probe", depth = $depth, targets = $targets)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const FETCH: &str = "sitegate.fetch";
    pub const LAYER: &str = "sitegate.layer";
    pub const PROBE: &str = "sitegate.probe";
}
