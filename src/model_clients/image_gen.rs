//! `ImageGen` — §4.A capability #3.
//!
//! Given `(prompt, optional_image_refs)`, returns raw image bytes. Carries
//! a declared primary model and an ordered fallback ladder: on non-transient
//! failure or retry-ladder exhaustion for the current model, advance to the
//! next model in the ladder, preserving the same prompt.

use std::time::Instant;

use async_trait::async_trait;

use crate::error::PipelineError;

use super::retry::{retry_with_backoff, ModelCallError, RetryPolicy};
use super::trace::{record_call, CallOutcome};

#[async_trait]
pub trait ImageGenProvider: Send + Sync {
    /// Generate an image with the named model. `image_refs` are
    /// attachments (reference logos, moodboard images, style refs).
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        image_refs: &[Vec<u8>],
    ) -> Result<Vec<u8>, ModelCallError>;
}

pub struct ImageGenClient<P: ImageGenProvider> {
    provider: P,
    ladder: Vec<String>,
    retry_policy: RetryPolicy,
}

impl<P: ImageGenProvider> ImageGenClient<P> {
    pub fn new(provider: P, ladder: Vec<String>) -> Self {
        Self {
            provider,
            ladder,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Generate an image, advancing down the fallback ladder on failure.
    /// The prompt is preserved verbatim across ladder steps (§4.A).
    /// Fails with `ModelFallbackExhausted` only once every model in the
    /// ladder has failed.
    pub async fn generate(
        &self,
        stage: &str,
        prompt: &str,
        image_refs: &[Vec<u8>],
    ) -> Result<Vec<u8>, PipelineError> {
        let mut failures = Vec::new();

        for model in &self.ladder {
            let started = Instant::now();
            let call_id = format!("{stage}-{model}");
            match retry_with_backoff(&self.retry_policy, &call_id, || {
                self.provider.generate(model, prompt, image_refs)
            })
            .await
            {
                Ok(bytes) => {
                    record_call(stage, model, started.elapsed(), CallOutcome::Success);
                    return Ok(bytes);
                }
                Err(e) => {
                    record_call(stage, model, started.elapsed(), CallOutcome::Failed);
                    failures.push(format!("{model}: {e}"));
                }
            }
        }

        Err(PipelineError::ModelFallbackExhausted(failures.join("; ")))
    }
}
