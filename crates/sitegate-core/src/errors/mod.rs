//! Error handling for sitegate.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod error_code;
pub mod fact_store_error;
pub mod fetch_error;
pub mod layer_error;
pub mod report_error;
pub mod run_error;

pub use config_error::ConfigError;
pub use error_code::ErrorCode;
pub use fact_store_error::FactStoreError;
pub use fetch_error::FetchError;
pub use layer_error::LayerError;
pub use report_error::ReportError;
pub use run_error::SiteGateError;
