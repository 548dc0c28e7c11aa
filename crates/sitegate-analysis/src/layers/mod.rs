//! The five diagnostic layers and the contract they share.
//!
//! A layer reads the site snapshot and the run configuration, appends
//! findings to its [`FindingSink`], and returns. It never sees other
//! layers' findings. Errors are returned, not raised: the orchestrator turns
//! them into findings of the failing layer.

pub mod content_quality;
pub mod fact_consistency;
pub mod link_integrity;
pub mod security;
pub mod sink;
pub mod structural;

use std::sync::Arc;

use sitegate_core::config::RunConfiguration;
use sitegate_core::errors::LayerError;
use sitegate_core::traits::{Cancellable, CancellationToken};
use sitegate_core::types::{Finding, LayerId};

use crate::facts::FactStore;
use crate::fetcher::{LinkProbe, Page, SiteSnapshot};

pub use content_quality::ContentQualityLayer;
pub use fact_consistency::FactConsistencyLayer;
pub use link_integrity::LinkIntegrityLayer;
pub use security::SecurityLayer;
pub use sink::FindingSink;
pub use structural::StructuralLayer;

/// One independent diagnostic pass.
pub trait DiagnosticLayer: Send + Sync {
    fn id(&self) -> LayerId;

    fn name(&self) -> &'static str {
        self.id().title()
    }

    fn run(&self, ctx: &LayerContext<'_>, sink: &FindingSink) -> Result<(), LayerError>;
}

/// Read-only inputs shared by all layers of a run.
pub struct LayerContext<'a> {
    pub site: &'a SiteSnapshot,
    pub config: &'a RunConfiguration,
    pub facts: Option<&'a FactStore>,
    pub cancel: &'a CancellationToken,
}

impl<'a> LayerContext<'a> {
    pub fn pages(&self) -> &'a [Page] {
        &self.site.pages
    }

    /// `Err(Cancelled)` once the run has been cancelled or its budget spent.
    pub fn check_cancelled(&self) -> Result<(), LayerError> {
        if self.cancel.is_cancelled() {
            return Err(LayerError::Cancelled);
        }
        Ok(())
    }
}

/// The built-in layers in execution sequence.
pub fn default_layers(probe: Arc<dyn LinkProbe>) -> Vec<Box<dyn DiagnosticLayer>> {
    vec![
        Box::new(SecurityLayer),
        Box::new(StructuralLayer),
        Box::new(ContentQualityLayer),
        Box::new(LinkIntegrityLayer::new(probe)),
        Box::new(FactConsistencyLayer),
    ]
}

/// Run one layer outside the orchestrator and collect what it emits.
pub fn run_layer(
    layer: &dyn DiagnosticLayer,
    ctx: &LayerContext<'_>,
) -> Result<Vec<Finding>, LayerError> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let sink = FindingSink::new(layer.id(), 0, tx);
    let outcome = layer.run(ctx, &sink);
    drop(sink);
    let findings = rx
        .try_iter()
        .filter_map(|event| match event {
            sink::SinkEvent::Finding { finding, .. } => Some(finding),
            sink::SinkEvent::Done { .. } => None,
        })
        .collect();
    outcome.map(|()| findings)
}
