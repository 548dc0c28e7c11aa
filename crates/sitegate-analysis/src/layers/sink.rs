//! Append-only finding sink feeding the single aggregator.

use std::cell::Cell;
use std::time::Duration;

use crossbeam_channel::Sender;
use sitegate_core::errors::LayerError;
use sitegate_core::types::{Finding, LayerId};

/// Messages from layer threads to the aggregator.
#[derive(Debug)]
pub(crate) enum SinkEvent {
    Finding {
        ordinal: usize,
        finding: Finding,
    },
    Done {
        ordinal: usize,
        outcome: Result<(), LayerError>,
        elapsed: Duration,
    },
}

/// Where one layer appends its findings. Order of `emit` calls is preserved.
pub struct FindingSink {
    layer: LayerId,
    ordinal: usize,
    tx: Sender<SinkEvent>,
    emitted: Cell<usize>,
}

impl FindingSink {
    pub(crate) fn new(layer: LayerId, ordinal: usize, tx: Sender<SinkEvent>) -> Self {
        Self {
            layer,
            ordinal,
            tx,
            emitted: Cell::new(0),
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Append a finding. Findings attributed to another layer are dropped.
    pub fn emit(&self, finding: Finding) {
        if finding.layer() != self.layer {
            tracing::warn!(
                sink = %self.layer,
                finding = %finding.layer(),
                rule = finding.rule_id(),
                "finding emitted into another layer's sink, dropped"
            );
            return;
        }
        self.emitted.set(self.emitted.get() + 1);
        // receiver outlives every layer thread
        let _ = self.tx.send(SinkEvent::Finding {
            ordinal: self.ordinal,
            finding,
        });
    }

    /// Number of findings accepted so far.
    pub fn emitted(&self) -> usize {
        self.emitted.get()
    }

    pub(crate) fn finish(self, outcome: Result<(), LayerError>, elapsed: Duration) {
        let _ = self.tx.send(SinkEvent::Done {
            ordinal: self.ordinal,
            outcome,
            elapsed,
        });
    }
}
