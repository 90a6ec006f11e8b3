//! # brandkit
//!
//! The pipeline orchestration engine behind a multi-stage AI Creative
//! Director: it turns a brand brief into four strategically distinct
//! brand-identity directions and, for a designer-chosen direction, a full
//! production asset kit (logo variants, palette, pattern, mockups, social
//! templates).
//!
//! The crate is organized as a linear sequence of stages (`stages`)
//! fanning out in bounded parallel where the work is independent,
//! communicating only through the validated value objects in `types`.
//! [`runner::PipelineRunner`] is the single entry point: `run_logos_phase`
//! for Phase 1 (logos only, human-in-the-loop review), then
//! `run_assets_phase` for Phase 2 (full kit for the chosen direction).

pub mod color;
pub mod config;
pub mod error;
pub mod model_clients;
pub mod progress;
pub mod reference_index;
pub mod runner;
pub mod stages;
pub mod style_dna_extractor;
pub mod types;
pub mod util;

pub use config::Config;
pub use error::PipelineError;
pub use progress::{EventStatus, PipelineEvent, ProgressSink};
pub use runner::{CancellationToken, PhaseState, PipelineRunner};
pub use style_dna_extractor::StyleDnaCache;
