//! The immutable per-run configuration handed to every layer.

use std::path::PathBuf;
use std::time::Duration;

use super::SiteGateConfig;
use crate::errors::ConfigError;
use crate::types::{LayerId, RunMode};

/// Raw run flags as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunFlags {
    pub target: Option<String>,
    pub pre_deploy: bool,
    pub quiet: bool,
    pub summary: bool,
    pub critical_only: bool,
    pub no_links: bool,
    pub no_facts: bool,
}

/// Everything a run needs, resolved once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// Site root: a directory, a single page file, or an http(s) base URL.
    pub target: String,
    pub mode: RunMode,
    pub skip_links: bool,
    pub skip_facts: bool,
    pub fact_sheet: Option<PathBuf>,
    pub timeout: Duration,
    pub workers: usize,
    /// Layers to run, in execution sequence, before skip flags apply.
    pub layers: Vec<LayerId>,
    /// The resolved configuration the values above were taken from.
    pub settings: SiteGateConfig,
}

impl RunConfiguration {
    /// Combine command-line flags with a resolved config.
    ///
    /// Mode flags are mutually exclusive and a target is mandatory.
    pub fn from_flags(flags: RunFlags, settings: SiteGateConfig) -> Result<Self, ConfigError> {
        let selected: Vec<&str> = [
            (flags.pre_deploy, "--pre-deploy"),
            (flags.quiet, "--quiet"),
            (flags.summary, "--summary"),
            (flags.critical_only, "--critical-only"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();
        if selected.len() > 1 {
            return Err(ConfigError::ConflictingFlags(format!(
                "{} cannot be combined",
                selected.join(" and ")
            )));
        }

        let mode = if flags.pre_deploy {
            RunMode::PreDeploy {
                max_warnings: settings.run.effective_max_warnings(),
            }
        } else if flags.quiet {
            RunMode::Quiet
        } else if flags.summary {
            RunMode::Summary
        } else if flags.critical_only {
            RunMode::CriticalOnly
        } else {
            RunMode::Normal
        };

        let target = flags
            .target
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingTarget)?;

        Self::new(target, mode, settings).map(|mut config| {
            config.skip_links = flags.no_links;
            config.skip_facts = flags.no_facts;
            config
        })
    }

    /// Build a configuration for a target and mode with nothing skipped.
    pub fn new(
        target: impl Into<String>,
        mode: RunMode,
        settings: SiteGateConfig,
    ) -> Result<Self, ConfigError> {
        SiteGateConfig::validate(&settings)?;
        Ok(Self {
            target: target.into(),
            mode,
            skip_links: false,
            skip_facts: false,
            fact_sheet: settings.facts.sheet.clone(),
            timeout: Duration::from_secs(settings.run.effective_timeout_secs()),
            workers: settings.run.effective_workers(),
            layers: settings.enabled_layers()?,
            settings,
        })
    }

    /// Whether a layer runs, taking both the layer subset and skip flags into account.
    pub fn is_layer_enabled(&self, layer: LayerId) -> bool {
        let skipped = match layer {
            LayerId::LinkIntegrity => self.skip_links,
            LayerId::FactConsistency => self.skip_facts,
            _ => false,
        };
        !skipped && self.layers.contains(&layer)
    }

    /// Enabled layers in execution sequence.
    pub fn active_layers(&self) -> Vec<LayerId> {
        LayerId::SEQUENCE
            .into_iter()
            .filter(|l| self.is_layer_enabled(*l))
            .collect()
    }
}
