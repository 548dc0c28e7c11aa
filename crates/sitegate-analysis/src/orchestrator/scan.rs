//! Concurrent layer execution with a single aggregator.
//!
//! Each layer runs on its own scoped thread and streams findings over one
//! channel. The calling thread drains the channel, buckets findings by the
//! layer's position in the sequence and, once the run budget is spent, trips
//! the cancellation token and keeps draining until every layer has reported.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use sitegate_core::errors::LayerError;
use sitegate_core::layer_span;
use sitegate_core::traits::Cancellable;
use sitegate_core::types::{Finding, LayerId, Location, Severity};

use crate::layers::sink::SinkEvent;
use crate::layers::{DiagnosticLayer, FindingSink, LayerContext};

pub const LAYER_ERROR_RULE: &str = "layer_error";
pub const TIMEOUT_RULE: &str = "timeout";

/// Findings of all layers in sequence order.
#[derive(Debug, Default)]
pub(crate) struct ScanOutput {
    pub findings: Vec<Finding>,
    pub timed_out: bool,
}

/// What one layer produced.
struct LayerSlot {
    id: LayerId,
    findings: Vec<Finding>,
    outcome: Option<Result<(), LayerError>>,
    elapsed: Duration,
}

/// Run `layers` (already in sequence order) against `ctx`.
pub(crate) fn scan_layers(layers: &[&dyn DiagnosticLayer], ctx: &LayerContext<'_>) -> ScanOutput {
    let mut slots: Vec<LayerSlot> = layers
        .iter()
        .map(|layer| LayerSlot {
            id: layer.id(),
            findings: Vec::new(),
            outcome: None,
            elapsed: Duration::ZERO,
        })
        .collect();
    let mut timed_out = false;

    thread::scope(|scope| {
        let (tx, rx) = crossbeam_channel::unbounded::<SinkEvent>();

        for (ordinal, &layer) in layers.iter().enumerate() {
            let tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("sitegate-{}", layer.id()))
                .spawn_scoped(scope, move || {
                    let _span = layer_span!(layer.id(), ctx.pages().len()).entered();
                    let sink = FindingSink::new(layer.id(), ordinal, tx);
                    let started = Instant::now();
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| layer.run(ctx, &sink)))
                        .unwrap_or_else(|payload| Err(LayerError::Panicked(panic_message(&*payload))));
                    sink.finish(outcome, started.elapsed());
                });
            if let Err(e) = spawned {
                slots[ordinal].outcome = Some(Err(LayerError::Failed(format!(
                    "could not start layer thread: {e}"
                ))));
            }
        }
        drop(tx);

        let deadline = ctx.cancel.deadline();
        loop {
            let received = match deadline {
                Some(deadline) if !timed_out => rx.recv_deadline(deadline),
                _ => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(SinkEvent::Finding { ordinal, finding }) => slots[ordinal].findings.push(finding),
                Ok(SinkEvent::Done {
                    ordinal,
                    outcome,
                    elapsed,
                }) => {
                    let slot = &mut slots[ordinal];
                    slot.outcome = Some(outcome);
                    slot.elapsed = elapsed;
                }
                Err(RecvTimeoutError::Timeout) => {
                    timed_out = true;
                    ctx.cancel.cancel();
                    tracing::warn!("run budget elapsed, cancelling unfinished layers");
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    });

    let target = &ctx.config.target;
    let mut findings = Vec::with_capacity(slots.iter().map(|s| s.findings.len() + 1).sum());
    for slot in slots {
        let emitted = slot.findings.len();
        findings.extend(slot.findings);
        match slot.outcome {
            Some(Ok(())) => {
                tracing::info!(
                    layer = %slot.id,
                    findings = emitted,
                    elapsed_ms = slot.elapsed.as_millis() as u64,
                    "layer completed"
                );
            }
            Some(Err(LayerError::Cancelled)) => {
                timed_out = true;
                tracing::warn!(layer = %slot.id, findings = emitted, "layer cancelled");
                findings.push(Finding::new(
                    slot.id,
                    Severity::Medium,
                    TIMEOUT_RULE,
                    Location::page(target.as_str()),
                    format!(
                        "{} did not complete within the {}s run budget; {emitted} finding(s) kept",
                        slot.id.title(),
                        ctx.config.timeout.as_secs()
                    ),
                ));
            }
            Some(Err(e)) => {
                tracing::error!(layer = %slot.id, error = %e, "layer failed");
                findings.push(Finding::new(
                    slot.id,
                    Severity::Medium,
                    LAYER_ERROR_RULE,
                    Location::page(target.as_str()),
                    format!("{} could not complete: {e}", slot.id.title()),
                ));
            }
            None => {
                tracing::error!(layer = %slot.id, "layer ended without reporting");
                findings.push(Finding::new(
                    slot.id,
                    Severity::Medium,
                    LAYER_ERROR_RULE,
                    Location::page(target.as_str()),
                    format!("{} ended without reporting an outcome", slot.id.title()),
                ));
            }
        }
    }

    ScanOutput {
        findings,
        timed_out,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
