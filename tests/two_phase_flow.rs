//! End-to-end two-phase flow against in-memory capability providers
//! (§8 end-to-end scenarios, P10 partial-failure, P11 cancellation).
//!
//! These are integration tests, not unit tests, so they can't reach the
//! library's `#[cfg(test)] model_clients::mock` fixtures (that module
//! only exists when the crate compiles itself under test) — instead each
//! test defines its own minimal `TextProvider`/`VisionProvider`/
//! `ImageGenProvider` implementations directly against the public trait
//! contracts.

use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use brandkit::model_clients::{ImageGenClient, ImageGenProvider, ModelCallError, TextProvider, TextStructuredClient, VisionProvider};
use brandkit::types::Brief;
use brandkit::{Config, PipelineRunner, ProgressSink};

/// Replays a fixed queue of JSON responses, one per `complete` call, in
/// order — mirroring the shape of the library's own `MockTextProvider`.
struct QueuedTextProvider {
    responses: Mutex<Vec<Value>>,
}

impl QueuedTextProvider {
    fn new(responses: Vec<Value>) -> Self {
        Self { responses: Mutex::new(responses) }
    }
}

#[async_trait]
impl TextProvider for QueuedTextProvider {
    fn model(&self) -> &str {
        "test-text"
    }

    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<Value, ModelCallError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ModelCallError::Fatal("queue exhausted".to_string()));
        }
        Ok(responses.remove(0))
    }
}

struct NoopVisionProvider;

#[async_trait]
impl VisionProvider for NoopVisionProvider {
    fn model(&self) -> &str {
        "test-vision"
    }

    async fn analyze(&self, _prompt: &str, _image_refs: &[Vec<u8>]) -> Result<Value, ModelCallError> {
        Err(ModelCallError::Fatal("no vision provider configured for this test".to_string()))
    }
}

/// Returns a valid 1x1 PNG for every call whose prompt doesn't contain
/// `fail_marker`, and a fatal error for calls that do — lets a single
/// direction's logo generation fail on demand (P10) while the rest
/// succeed, without a real model endpoint.
struct ImageProvider {
    fail_marker: Option<&'static str>,
}

impl ImageProvider {
    fn always_succeeds() -> Self {
        Self { fail_marker: None }
    }

    fn failing(marker: &'static str) -> Self {
        Self { fail_marker: Some(marker) }
    }

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }
}

#[async_trait]
impl ImageGenProvider for ImageProvider {
    async fn generate(&self, _model: &str, prompt: &str, _image_refs: &[Vec<u8>]) -> Result<Vec<u8>, ModelCallError> {
        if let Some(marker) = self.fail_marker {
            if prompt.contains(marker) {
                return Err(ModelCallError::Fatal(format!("simulated failure for {marker}")));
            }
        }
        Ok(Self::tiny_png())
    }
}

fn brief() -> Brief {
    Brief::new(
        "Roast & Co",
        "a direct-trade coffee subscription",
        "urban professionals",
        "warm, artisanal",
        vec!["Blue Bottle".to_string()],
        "exceptional coffee, honestly sourced",
        vec!["coffee".to_string()],
        vec![],
        vec![],
        None,
    )
    .unwrap()
}

fn direction_json(option_number: u8, hue_hex: &str) -> Value {
    json!({
        "option_number": option_number,
        "option_type": ["Market-Aligned", "Designer-Led", "Hybrid", "Wild-Card"][option_number as usize - 1],
        "direction_name": format!("Direction {option_number}"),
        "rationale": "because",
        "colors": [
            {"hex": hue_hex, "role": "primary", "name": "Primary"},
            {"hex": "#101010", "role": "neutral-dark", "name": "Ink"},
            {"hex": "#F5F5F5", "role": "neutral-light", "name": "Paper"}
        ],
        "typography_primary": "Custom Sans",
        "typography_secondary": "Custom Serif",
        "graphic_style": "minimal",
        "logo_spec": {
            "logo_type": "symbol",
            "form": "a sunrise arc",
            "composition": "centered",
            "color_hex": hue_hex,
            "fill_style": "solid_fill",
            "stroke_weight": "medium",
            "typography_treatment": "custom",
            "render_style": "flat vector",
            "metaphor": "warmth",
            "avoid": []
        },
        "pattern_spec": {
            "motif": "leaves",
            "layout": "grid",
            "color_hexes": [hue_hex],
            "density": "sparse",
            "render_style": "flat",
            "avoid": []
        },
        "background_spec": {
            "scene_description": "studio",
            "color_hexes": ["#F5F5F5"],
            "mood": "calm",
            "render_style": "flat",
            "avoid": []
        },
        "tagline": "Always fresh.",
        "ad_slogan": "Brewed right.",
        "announcement_copy": "Now shipping."
    })
}

fn valid_directions_output() -> Value {
    json!({
        "directions": [
            direction_json(1, "#CC3333"),
            direction_json(2, "#3355CC"),
            direction_json(3, "#33AA66"),
            direction_json(4, "#AA33CC"),
        ]
    })
}

fn make_runner(
    image_provider: ImageProvider,
    director_response: Value,
) -> PipelineRunner<QueuedTextProvider, NoopVisionProvider, ImageProvider> {
    // Research consumes the first queued response (empty — every field
    // defaults) before the Director consumes the second.
    let text_client = TextStructuredClient::new(QueuedTextProvider::new(vec![json!({}), director_response]));
    let image_client = ImageGenClient::new(image_provider, vec!["test-image".to_string()]);
    PipelineRunner::new(Config::default(), text_client, image_client)
}

#[tokio::test]
async fn phase1_then_phase2_full_success() {
    let output_root = TempDir::new().unwrap();
    let runner = make_runner(ImageProvider::always_succeeds(), valid_directions_output());

    let logos = runner
        .run_logos_phase(&brief(), output_root.path(), ProgressSink::noop(), None)
        .await;

    assert!(logos.success, "expected all four directions to succeed: {:?}", logos.error);
    let directions = logos.directions.expect("directions must be present on success");
    assert_eq!(directions.directions().len(), 4);
    for (_, status) in &logos.per_direction_status {
        assert!(status.is_ok());
    }

    let chosen = 2u8;
    let assets = &logos.assets_by_option[&chosen];
    let logo_path = assets.logo.clone().expect("chosen direction must have a logo");
    assert!(logo_path.exists());

    let asset_output = TempDir::new().unwrap();
    let result = runner
        .run_assets_phase(
            &directions,
            chosen,
            &brief(),
            &logo_path,
            &[],
            asset_output.path(),
            ProgressSink::noop(),
            None,
        )
        .await;

    assert!(result.success, "expected the asset phase to succeed: {:?}", result.error);
    assert!(result.assets.logo_black.is_some());
    assert!(result.assets.logo_white.is_some());
    assert!(result.assets.logo_transparent.is_some());
    assert!(result.per_asset_status["pattern"].is_ok());
    assert!(result.per_asset_status["logo_variants"].is_ok());
}

/// P10: one direction's logo generation fails; the phase still reports
/// success for the other three instead of aborting the whole run.
#[tokio::test]
async fn phase1_partial_failure_degrades_gracefully() {
    let output_root = TempDir::new().unwrap();
    // Direction 3's primary color hex is the unique substring embedded in
    // its logo prompt (`compose_prompt` includes `color_hex: {hex}`).
    let runner = make_runner(ImageProvider::failing("33AA66"), valid_directions_output());

    let logos = runner
        .run_logos_phase(&brief(), output_root.path(), ProgressSink::noop(), None)
        .await;

    assert!(logos.success, "three of four directions succeeded, phase should still report success");
    assert_eq!(logos.phase_state, brandkit::PhaseState::DonePartial);
    assert!(logos.directions.is_some());
    assert_eq!(logos.per_direction_status.values().filter(|s| s.is_ok()).count(), 3);
    assert!(!logos.per_direction_status[&3].is_ok());
    assert!(logos.assets_by_option[&1].logo.is_some());
    assert!(logos.assets_by_option[&3].logo.is_none());
}

/// P11: cancelling before a phase starts preserves no partial output and
/// reports the cancellation distinctly from a failure.
#[tokio::test]
async fn phase1_cancelled_before_start_returns_cancelled_result() {
    let output_root = TempDir::new().unwrap();
    let runner = make_runner(ImageProvider::always_succeeds(), valid_directions_output());

    let (_tx, rx) = tokio::sync::watch::channel(true);
    let logos = runner
        .run_logos_phase(&brief(), output_root.path(), ProgressSink::noop(), Some(rx))
        .await;

    assert!(!logos.success);
    assert!(logos.directions.is_none());
    assert_eq!(logos.error.as_deref(), Some("cancelled"));
    assert!(std::fs::read_dir(output_root.path()).unwrap().next().is_none(), "no files should be written");
}

/// Progress events are emitted for every stage boundary and survive a
/// panicking callback (§4.K untrusted-callback guarantee).
#[tokio::test]
async fn progress_sink_panics_do_not_abort_the_phase() {
    let output_root = TempDir::new().unwrap();
    let runner = make_runner(ImageProvider::always_succeeds(), valid_directions_output());

    let sink = ProgressSink::new(|_event| panic!("misbehaving caller"));
    let logos = runner.run_logos_phase(&brief(), output_root.path(), sink, None).await;

    assert!(logos.success, "a panicking on_progress callback must not fail the phase");
}
