//! Stable error codes printed in fatal diagnostics.

/// Maps an error to a stable, machine-matchable code.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const FETCH_ERROR: &str = "FETCH_ERROR";
pub const FACT_STORE_ERROR: &str = "FACT_STORE_ERROR";
pub const LAYER_ERROR: &str = "LAYER_ERROR";
pub const REPORT_ERROR: &str = "REPORT_ERROR";
pub const CANCELLED: &str = "CANCELLED";
