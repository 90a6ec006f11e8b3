//! Error taxonomy for the brand pipeline.
//!
//! One `thiserror` enum per error *kind* rather than per call site, so
//! callers can match on kind instead of parsing a message.

use thiserror::Error;

/// Errors that can surface from any stage of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The brief failed schema validation at ingress. Refused before any
    /// stage runs.
    #[error("brief is invalid: {0}")]
    BriefInvalid(String),

    /// A model call hit a rate limit or transient network failure. Retried
    /// transparently; only surfaces if retries are exhausted without a
    /// fallback ladder to fall back to.
    #[error("model call failed transiently after retries: {0}")]
    ModelTransient(String),

    /// A model call failed with a non-retryable error (bad auth, malformed
    /// request, rejected content) — distinct from `ModelTransient`, which
    /// is reserved for transient failures surfacing only after retries are
    /// exhausted.
    #[error("model call failed with a non-retryable error: {0}")]
    ModelFatal(String),

    /// Structured output failed schema validation after repair attempts.
    /// Fatal for the stage that raised it.
    #[error("model output did not satisfy the schema after repair attempts: {0}")]
    ModelSchemaViolation(String),

    /// The image-gen fallback ladder was exhausted for a call. Degradable:
    /// callers record a null asset and continue.
    #[error("image generation fallback ladder exhausted: {0}")]
    ModelFallbackExhausted(String),

    /// No reference image or styleguide matched the requested tags.
    /// Degradable: the prompt proceeds without it.
    #[error("no reference matched tags: {0:?}")]
    ReferenceMissing(Vec<String>),

    /// Style-DNA vision extraction failed for a reference image.
    /// Degradable: downstream prompts proceed without MUST-MATCH clauses.
    #[error("style-DNA extraction failed: {0}")]
    StyleDnaFailure(String),

    /// The Director's output violated a structural invariant (§3) after
    /// two repair attempts. Fatal for the phase.
    #[error("director output invalid after repair attempts: {0}")]
    DirectorOutputInvalid(String),

    /// A single per-asset, per-direction generation failure. Recorded in
    /// the phase result; never fatal to the phase.
    #[error("asset generation failed for {direction}/{asset}: {reason}")]
    AssetGenerationFailed {
        direction: u8,
        asset: String,
        reason: String,
    },

    /// The caller cancelled the phase.
    #[error("cancelled")]
    Cancelled,

    /// Styleguide document failed the structural contract (§6, P6) at load
    /// time.
    #[error("styleguide {path} does not conform to the documented contract: {reason}")]
    StyleguideNonConformant { path: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Whether an error is degradable (the caller can record it and continue)
/// or fatal to the enclosing phase. Used by the runner to decide whether a
/// stage failure ends the phase in `FAILED` or continues toward
/// `DONE_PARTIAL`.
impl PipelineError {
    pub fn is_fatal_to_phase(&self) -> bool {
        matches!(
            self,
            PipelineError::BriefInvalid(_)
                | PipelineError::DirectorOutputInvalid(_)
                | PipelineError::ModelSchemaViolation(_)
                | PipelineError::ModelFatal(_)
        )
    }
}

/// Result alias for fallible operations whose error is always recorded,
/// never propagated out of the phase.
pub type PhaseResult<T> = Result<T, PipelineError>;
