//! `Vision` — §4.A capability #2.
//!
//! Given `(prompt, image_refs)`, returns text; when a schema is supplied,
//! the response is structured the same way `TextStructured` structures
//! its output.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PipelineError;

use super::retry::{retry_with_backoff, ModelCallError, RetryPolicy};
use super::trace::{record_call, CallOutcome};

#[async_trait]
pub trait VisionProvider: Send + Sync {
    fn model(&self) -> &str;

    async fn analyze(
        &self,
        prompt: &str,
        image_refs: &[Vec<u8>],
    ) -> Result<Value, ModelCallError>;
}

pub struct VisionClient<P: VisionProvider> {
    provider: P,
    retry_policy: RetryPolicy,
}

impl<P: VisionProvider> VisionClient<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Analyze image bytes already loaded into memory.
    pub async fn analyze_structured<T: DeserializeOwned>(
        &self,
        stage: &str,
        prompt: &str,
        image_refs: &[Vec<u8>],
    ) -> Result<T, PipelineError> {
        let started = Instant::now();
        let call_id = format!("{stage}-vision");
        let raw = retry_with_backoff(&self.retry_policy, &call_id, || {
            self.provider.analyze(prompt, image_refs)
        })
        .await?;

        let value = serde_json::from_value::<T>(raw).map_err(|e| {
            record_call(stage, self.provider.model(), started.elapsed(), CallOutcome::Failed);
            PipelineError::ModelSchemaViolation(e.to_string())
        })?;
        record_call(stage, self.provider.model(), started.elapsed(), CallOutcome::Success);
        Ok(value)
    }

    /// Load image files from disk, then analyze.
    pub async fn analyze_structured_from_paths<T: DeserializeOwned>(
        &self,
        stage: &str,
        prompt: &str,
        paths: &[&Path],
    ) -> Result<T, PipelineError> {
        let mut refs = Vec::with_capacity(paths.len());
        for path in paths {
            refs.push(tokio::fs::read(path).await?);
        }
        self.analyze_structured(stage, prompt, &refs).await
    }
}
