//! Configuration system for sitegate.
//! TOML-based, 4-layer resolution: CLI > env > project > user > defaults.

pub mod facts_config;
pub mod fetch_config;
pub mod layer_configs;
pub mod run_configuration;
pub mod run_settings;
pub mod sitegate_config;

pub use facts_config::FactsConfig;
pub use fetch_config::FetchConfig;
pub use layer_configs::{ContentConfig, LinksConfig, SecurityConfig, StructuralConfig};
pub use run_configuration::{RunConfiguration, RunFlags};
pub use run_settings::RunSettings;
pub use sitegate_config::{CliOverrides, SiteGateConfig};
