//! Progress events and the `on_progress` contract (§4.K, §6).
//!
//! Every event gets a UUID and a UTC timestamp, and events are flattened
//! to a single concrete struct rather than a trait-object event bus —
//! this pipeline has one event shape, not an extensible taxonomy of them.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Started,
    Succeeded,
    Failed,
    Skipped,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub stage: String,
    pub item: Option<String>,
    pub status: EventStatus,
    pub elapsed: Duration,
    pub detail: Option<String>,
}

impl PipelineEvent {
    pub fn new(
        stage: impl Into<String>,
        item: Option<String>,
        status: EventStatus,
        elapsed: Duration,
        detail: Option<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            stage: stage.into(),
            item,
            status,
            elapsed,
            detail,
        }
    }
}

/// A caller-supplied progress sink. Treated as untrusted per §4.K: a panic
/// or any misbehavior inside `emit` must never abort the pipeline.
#[derive(Clone)]
pub struct ProgressSink {
    callback: Arc<dyn Fn(PipelineEvent) + Send + Sync>,
}

impl ProgressSink {
    pub fn new(callback: impl Fn(PipelineEvent) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// A sink that drops every event, for tests and dry runs.
    pub fn noop() -> Self {
        Self::new(|_event| {})
    }

    pub fn emit(&self, event: PipelineEvent) {
        let callback = self.callback.clone();
        let result = catch_unwind(AssertUnwindSafe(|| (callback)(event)));
        if let Err(panic) = result {
            log::warn!("on_progress callback panicked, ignoring: {:?}", panic_message(&panic));
        }
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
