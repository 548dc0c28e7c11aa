//! Top-level sitegate configuration with 4-layer resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    ContentConfig, FactsConfig, FetchConfig, LinksConfig, RunSettings, SecurityConfig,
    StructuralConfig,
};
use crate::errors::ConfigError;
use crate::types::LayerId;

/// File name looked up in the working directory when no `--config` is given.
pub const PROJECT_CONFIG_FILE: &str = "sitegate.toml";

/// Top-level configuration aggregating all sections.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`SITEGATE_*`)
/// 3. Project config (`--config` path, else `sitegate.toml`)
/// 4. User config (`~/.sitegate/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SiteGateConfig {
    pub run: RunSettings,
    pub fetch: FetchConfig,
    pub security: SecurityConfig,
    pub structural: StructuralConfig,
    pub content: ContentConfig,
    pub links: LinksConfig,
    pub facts: FactsConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub timeout_secs: Option<u64>,
    pub max_warnings: Option<usize>,
    pub workers: Option<usize>,
    pub max_pages: Option<usize>,
    pub check_external: Option<bool>,
    pub fact_sheet: Option<PathBuf>,
}

impl SiteGateConfig {
    /// Load configuration with 4-layer resolution.
    ///
    /// `explicit` is a `--config` path and must exist; otherwise
    /// `sitegate.toml` in `cwd` is used when present.
    pub fn load(
        explicit: Option<&Path>,
        cwd: &Path,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!("ignoring user config: {e}");
                    }
                }
            }
        }

        // Layer 3: project config
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                Self::merge_toml_file(&mut config, path)?;
            }
            None => {
                let project_config_path = cwd.join(PROJECT_CONFIG_FILE);
                if project_config_path.is_file() {
                    Self::merge_toml_file(&mut config, &project_config_path)?;
                }
            }
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config)?;

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &SiteGateConfig) -> Result<(), ConfigError> {
        if config.run.timeout_secs == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "run.timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.run.workers == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "run.workers".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.fetch.max_pages == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "fetch.max_pages".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.fetch.request_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "fetch.request_timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        config.enabled_layers()?;
        Ok(())
    }

    /// The configured layer subset, in execution sequence. Empty config means all.
    pub fn enabled_layers(&self) -> Result<Vec<LayerId>, ConfigError> {
        if self.run.layers.is_empty() {
            return Ok(LayerId::SEQUENCE.to_vec());
        }
        let mut layers = Vec::with_capacity(self.run.layers.len());
        for name in &self.run.layers {
            let layer = name
                .parse::<LayerId>()
                .map_err(|message| ConfigError::ValidationFailed {
                    field: "run.layers".to_string(),
                    message,
                })?;
            if !layers.contains(&layer) {
                layers.push(layer);
            }
        }
        layers.sort_by_key(|l| l.rank());
        Ok(layers)
    }

    /// Returns the user config path: `~/.sitegate/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".sitegate").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut SiteGateConfig, path: &Path) -> Result<(), ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                path: path.display().to_string(),
            })?;

        let file_config: SiteGateConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        tracing::debug!(path = %path.display(), "merged config file");
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it sets a value.
    fn merge(base: &mut SiteGateConfig, other: &SiteGateConfig) {
        // Run
        if other.run.timeout_secs.is_some() {
            base.run.timeout_secs = other.run.timeout_secs;
        }
        if other.run.max_warnings.is_some() {
            base.run.max_warnings = other.run.max_warnings;
        }
        if other.run.workers.is_some() {
            base.run.workers = other.run.workers;
        }
        if !other.run.layers.is_empty() {
            base.run.layers = other.run.layers.clone();
        }

        // Fetch
        if other.fetch.max_pages.is_some() {
            base.fetch.max_pages = other.fetch.max_pages;
        }
        if other.fetch.request_timeout_secs.is_some() {
            base.fetch.request_timeout_secs = other.fetch.request_timeout_secs;
        }
        if other.fetch.max_retries.is_some() {
            base.fetch.max_retries = other.fetch.max_retries;
        }
        if other.fetch.user_agent.is_some() {
            base.fetch.user_agent = other.fetch.user_agent.clone();
        }
        if !other.fetch.extensions.is_empty() {
            base.fetch.extensions = other.fetch.extensions.clone();
        }
        if other.fetch.base_url.is_some() {
            base.fetch.base_url = other.fetch.base_url.clone();
        }

        // Layers
        if !other.security.disabled_rules.is_empty() {
            base.security.disabled_rules = other.security.disabled_rules.clone();
        }
        if !other.structural.tracked_tags.is_empty() {
            base.structural.tracked_tags = other.structural.tracked_tags.clone();
        }
        if other.content.max_examples.is_some() {
            base.content.max_examples = other.content.max_examples;
        }
        if other.links.check_external.is_some() {
            base.links.check_external = other.links.check_external;
        }
        if other.links.max_depth.is_some() {
            base.links.max_depth = other.links.max_depth;
        }

        // Facts
        if other.facts.sheet.is_some() {
            base.facts.sheet = other.facts.sheet.clone();
        }
        if other.facts.required.is_some() {
            base.facts.required = other.facts.required;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `SITEGATE_RUN_TIMEOUT_SECS`, `SITEGATE_FETCH_MAX_PAGES`, etc.
    /// A value that does not parse is a configuration error.
    fn apply_env_overrides(config: &mut SiteGateConfig) -> Result<(), ConfigError> {
        if let Some(v) = env_parse::<u64>("SITEGATE_RUN_TIMEOUT_SECS")? {
            config.run.timeout_secs = Some(v);
        }
        if let Some(v) = env_parse::<usize>("SITEGATE_RUN_MAX_WARNINGS")? {
            config.run.max_warnings = Some(v);
        }
        if let Some(v) = env_parse::<usize>("SITEGATE_RUN_WORKERS")? {
            config.run.workers = Some(v);
        }
        if let Some(v) = env_parse::<usize>("SITEGATE_FETCH_MAX_PAGES")? {
            config.fetch.max_pages = Some(v);
        }
        if let Some(v) = env_parse::<bool>("SITEGATE_LINKS_CHECK_EXTERNAL")? {
            config.links.check_external = Some(v);
        }
        if let Ok(val) = std::env::var("SITEGATE_FACTS_SHEET") {
            if !val.trim().is_empty() {
                config.facts.sheet = Some(PathBuf::from(val));
            }
        }
        Ok(())
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut SiteGateConfig, cli: &CliOverrides) {
        if let Some(v) = cli.timeout_secs {
            config.run.timeout_secs = Some(v);
        }
        if let Some(v) = cli.max_warnings {
            config.run.max_warnings = Some(v);
        }
        if let Some(v) = cli.workers {
            config.run.workers = Some(v);
        }
        if let Some(v) = cli.max_pages {
            config.fetch.max_pages = Some(v);
        }
        if let Some(v) = cli.check_external {
            config.links.check_external = Some(v);
        }
        if let Some(ref v) = cli.fact_sheet {
            config.facts.sheet = Some(v.clone());
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::ValidationFailed {
                field: key.to_string(),
                message: format!("cannot parse '{val}'"),
            }),
        Err(_) => Ok(None),
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
