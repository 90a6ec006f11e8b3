//! `TextStructured` — §4.A capability #1.
//!
//! Given `(system_prompt, user_prompt, json_schema)`, returns an instance
//! validated against `json_schema` or fails with `ModelSchemaViolation`
//! after N schema-repair attempts.
//!
//! "Validated against json_schema" is implemented by attempting to
//! deserialize the provider's raw JSON into the caller's target type,
//! treating a deserialization failure as a schema violation worth
//! repairing.

use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PipelineError;

use super::retry::{retry_with_backoff, ModelCallError, RetryPolicy};
use super::trace::{record_call, CallOutcome};

/// Raw provider transport: issues one completion call and returns the
/// model's raw JSON payload. Implementations speak to a specific backend
/// (OpenAI-style chat completions, Anthropic messages, etc.) over
/// `reqwest`; this crate ships a mock used by tests plus the contract
/// other callers implement for their provider of choice.
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn model(&self) -> &str;

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Value, ModelCallError>;
}

pub struct TextStructuredClient<P: TextProvider> {
    provider: P,
    retry_policy: RetryPolicy,
}

const MAX_SCHEMA_REPAIR_ATTEMPTS: u32 = 2;

impl<P: TextProvider> TextStructuredClient<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Issue a structured call, repairing schema violations by re-prompting
    /// with the validation error appended, up to `MAX_SCHEMA_REPAIR_ATTEMPTS`
    /// additional attempts.
    pub async fn call<T: DeserializeOwned>(
        &self,
        stage: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<T, PipelineError> {
        let mut prompt = user_prompt.to_string();
        let mut last_violation = String::new();

        for repair_attempt in 0..=MAX_SCHEMA_REPAIR_ATTEMPTS {
            let call_id = format!("{stage}-{repair_attempt}");
            let started = Instant::now();
            let raw = retry_with_backoff(&self.retry_policy, &call_id, || {
                self.provider.complete(system_prompt, &prompt)
            })
            .await?;

            match serde_json::from_value::<T>(raw) {
                Ok(value) => {
                    record_call(stage, self.provider.model(), started.elapsed(), CallOutcome::Success);
                    return Ok(value);
                }
                Err(e) => {
                    record_call(stage, self.provider.model(), started.elapsed(), CallOutcome::Retried);
                    last_violation = e.to_string();
                    prompt = format!(
                        "{user_prompt}\n\nYour previous response did not match the required \
                         schema: {last_violation}. Return ONLY JSON matching the schema."
                    );
                }
            }
        }

        Err(PipelineError::ModelSchemaViolation(last_violation))
    }
}
