//! Run orchestrator: fetch, scan, aggregate.
//!
//! Drives one run through [`RunState`]: loads the fact sheet and the site,
//! runs every enabled layer concurrently, then sorts, counts and derives the
//! exit status. Layer failures become findings; only configuration, fetch
//! and fact-sheet problems abort a run.

pub mod result;
pub mod scan;
pub mod state;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sitegate_core::config::RunConfiguration;
use sitegate_core::errors::{ConfigError, FactStoreError, SiteGateError};
use sitegate_core::traits::CancellationToken;
use sitegate_core::types::{ExitStatus, LayerId, SeverityCounts};

use crate::facts::FactStore;
use crate::fetcher::{
    ContentFetcher, ContentSource, HttpClient, HttpClientConfig, SiteProbe, SiteRoot, StatusCache,
};
use crate::layers::{default_layers, DiagnosticLayer, LayerContext};

pub use result::RunResult;
pub use scan::{LAYER_ERROR_RULE, TIMEOUT_RULE};
pub use state::RunState;

/// Runs the diagnostic layers over one site.
pub struct Orchestrator {
    config: RunConfiguration,
    source: Option<Box<dyn ContentSource>>,
    layers: Option<Vec<Box<dyn DiagnosticLayer>>>,
    state: RunState,
}

impl Orchestrator {
    /// An orchestrator with the built-in fetcher and layers.
    pub fn new(config: RunConfiguration) -> Self {
        Self {
            config,
            source: None,
            layers: None,
            state: RunState::Pending,
        }
    }

    /// Load pages from `source` instead of the filesystem/HTTP fetcher.
    pub fn with_source(mut self, source: Box<dyn ContentSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Run these layers instead of the built-in set.
    pub fn with_layers(mut self, layers: Vec<Box<dyn DiagnosticLayer>>) -> Self {
        self.layers = Some(layers);
        self
    }

    pub fn config(&self) -> &RunConfiguration {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Record that the report has been rendered.
    pub fn mark_reported(&mut self) -> bool {
        self.advance(RunState::Reported)
    }

    fn advance(&mut self, next: RunState) -> bool {
        if !self.state.can_advance_to(next) {
            tracing::error!(from = %self.state, to = %next, "refusing out-of-order run state transition");
            return false;
        }
        tracing::debug!(from = %self.state, to = %next, "run state");
        self.state = next;
        true
    }

    /// Execute the run. Fatal errors are returned; everything a layer runs
    /// into ends up in the result as a finding.
    pub fn run(&mut self) -> Result<RunResult, SiteGateError> {
        if !self.advance(RunState::Fetching) {
            return Err(ConfigError::InvalidArguments(format!(
                "run already started (state: {})",
                self.state
            ))
            .into());
        }
        let started_at = Utc::now();
        let clock = Instant::now();
        let cancel = CancellationToken::with_timeout(self.config.timeout);
        let fetch_config = &self.config.settings.fetch;

        let root = SiteRoot::parse(&self.config.target)?;
        ContentFetcher::base_url(fetch_config)?;
        let facts = self.load_facts()?.map(Arc::new);

        let http = HttpClient::new(HttpClientConfig::from(fetch_config))?;
        let cache = StatusCache::new();
        let site = match &self.source {
            Some(source) => source.load(&root, &cancel)?,
            None => ContentFetcher::new(fetch_config.clone(), Some(http.clone()), cache.clone())
                .load(&root, &cancel)?,
        };
        tracing::info!(
            pages = site.pages.len(),
            discovery = site.discovery.as_str(),
            unreachable = site.unreachable.len(),
            "site loaded"
        );

        let layers = match self.layers.take() {
            Some(layers) => layers,
            None => {
                let probe = SiteProbe::new(Some(http), cache, fetch_config.effective_extensions());
                default_layers(Arc::new(probe))
            }
        };
        let mut active: Vec<&dyn DiagnosticLayer> = layers
            .iter()
            .map(|l| l.as_ref())
            .filter(|l| self.config.is_layer_enabled(l.id()))
            .collect();
        active.sort_by_key(|l| l.id().rank());
        let layers_run: Vec<LayerId> = active.iter().map(|l| l.id()).collect();

        self.advance(RunState::Scanning);
        let ctx = LayerContext {
            site: &site,
            config: &self.config,
            facts: facts.as_deref(),
            cancel: &cancel,
        };
        let output = scan::scan_layers(&active, &ctx);

        self.advance(RunState::Aggregating);
        let counts = SeverityCounts::from_findings(&output.findings);
        let mut layer_counts = BTreeMap::new();
        for layer in &layers_run {
            layer_counts.insert(*layer, SeverityCounts::default());
        }
        for finding in &output.findings {
            layer_counts
                .entry(finding.layer())
                .or_insert_with(SeverityCounts::default)
                .record(finding.severity());
        }
        let exit_status = ExitStatus::from_counts(&counts, self.config.mode);

        let result = RunResult {
            target: self.config.target.clone(),
            mode: self.config.mode,
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
            pages_scanned: site.pages.len(),
            discovery: site.discovery,
            layers_run,
            findings: output.findings,
            counts,
            layer_counts,
            exit_status,
            timed_out: output.timed_out,
        };
        tracing::info!(
            critical = counts.critical,
            high = counts.high,
            medium = counts.medium,
            low = counts.low,
            exit_code = exit_status.code(),
            duration_ms = result.duration_ms,
            "run complete"
        );
        Ok(result)
    }

    fn load_facts(&self) -> Result<Option<FactStore>, FactStoreError> {
        if !self.config.is_layer_enabled(LayerId::FactConsistency) {
            return Ok(None);
        }
        match &self.config.fact_sheet {
            Some(path) => {
                let store = FactStore::load(path)?;
                tracing::info!(path = %path.display(), facts = store.len(), "fact sheet loaded");
                Ok(Some(store))
            }
            None if self.config.settings.facts.effective_required() => {
                Err(FactStoreError::NotConfigured)
            }
            None => {
                tracing::debug!("no fact sheet configured, fact consistency has nothing to check");
                Ok(None)
            }
        }
    }
}
