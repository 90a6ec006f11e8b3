//! Per-call observability (§4.A: "each call emits a trace record
//! `{stage, model, latency, outcome}`").
//!
//! Emitted as a structured `tracing` event rather than a bespoke logger:
//! `tracing` carries machine-parseable span/event data; plain `log`
//! carries prose messages elsewhere in this crate.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Retried,
    Failed,
}

pub fn record_call(stage: &str, model: &str, latency: Duration, outcome: CallOutcome) {
    tracing::info!(
        stage,
        model,
        latency_ms = latency.as_millis() as u64,
        outcome = ?outcome,
        "model call"
    );
}
