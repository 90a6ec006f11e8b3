//! Pipeline Runner (§4.K) — the single entry point per phase, driving the
//! stage state machine, emitting progress events at every boundary, and
//! honoring cooperative cancellation.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::Config;
use crate::error::PipelineError;
use crate::model_clients::{ImageGenClient, ImageGenProvider, TextProvider, TextStructuredClient, VisionProvider};
use crate::progress::{EventStatus, PipelineEvent, ProgressSink};
use crate::reference_index::ReferenceIndex;
use crate::stages::mockup_compositor::{self, PlacementZone};
use crate::stages::{asset_generator, director, logo_generator, research, social_compositor, tag_resolver};
use crate::style_dna_extractor::StyleDnaCache;
use crate::types::{AssetsPhaseResult, AssetStatus, Brief, BrandDirectionsOutput, LogosPhaseResult};

/// Phase-local lifecycle state, mirroring the diagram in §4.K. Exposed so
/// callers embedding the runner in a UI can render progress without
/// inferring it from events alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    Idle,
    Researching,
    Directing,
    Tagging,
    GeneratingLogos,
    Done,
    DonePartial,
    Failed,
    Cancelled,
}

/// Explicit transitions along the §4.K state diagram. Each method asserts
/// (debug-only) that it's called from the diagram's documented predecessor
/// state, and returns the successor — so the phase's actual control flow
/// drives the enum instead of the enum being a logging-only side note.
impl PhaseState {
    /// IDLE -> RESEARCHING.
    pub fn enter_researching(self) -> Self {
        debug_assert_eq!(self, PhaseState::Idle, "RESEARCHING only follows IDLE");
        PhaseState::Researching
    }

    /// RESEARCHING -> DIRECTING.
    pub fn enter_directing(self) -> Self {
        debug_assert_eq!(self, PhaseState::Researching, "DIRECTING only follows RESEARCHING");
        PhaseState::Directing
    }

    /// DIRECTING -> TAGGING.
    pub fn enter_tagging(self) -> Self {
        debug_assert_eq!(self, PhaseState::Directing, "TAGGING only follows DIRECTING");
        PhaseState::Tagging
    }

    /// TAGGING -> GENERATING_LOGOS.
    pub fn enter_generating_logos(self) -> Self {
        debug_assert_eq!(self, PhaseState::Tagging, "GENERATING_LOGOS only follows TAGGING");
        PhaseState::GeneratingLogos
    }

    /// GENERATING_LOGOS -> {DONE, DONE_PARTIAL, FAILED}, by per-direction
    /// success count: all four succeeding reaches DONE, at least one
    /// succeeding but not all reaches DONE_PARTIAL, none succeeding is
    /// treated as a failed phase (P10).
    pub fn enter_done(self, succeeded: usize, total: usize) -> Self {
        debug_assert_eq!(self, PhaseState::GeneratingLogos, "DONE/DONE_PARTIAL only follows GENERATING_LOGOS");
        if succeeded == 0 {
            PhaseState::Failed
        } else if succeeded == total {
            PhaseState::Done
        } else {
            PhaseState::DonePartial
        }
    }

    /// Any state -> FAILED, on a fatal error (`DirectorOutputInvalid`, etc).
    pub fn enter_failed(self) -> Self {
        PhaseState::Failed
    }

    /// Any state -> CANCELLED, on caller-initiated cancellation.
    pub fn enter_cancelled(self) -> Self {
        PhaseState::Cancelled
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PhaseState::Done | PhaseState::DonePartial | PhaseState::Failed | PhaseState::Cancelled
        )
    }
}

/// A cooperative cancellation signal: when the receiver observes `true`,
/// the runner stops at the next suspension point, preserving any files
/// already written (§5).
pub type CancellationToken = watch::Receiver<bool>;

fn is_cancelled(token: &Option<CancellationToken>) -> bool {
    token.as_ref().map(|t| *t.borrow()).unwrap_or(false)
}

pub struct PipelineRunner<TP, VP, IP>
where
    TP: TextProvider,
    VP: VisionProvider,
    IP: ImageGenProvider,
{
    pub config: Config,
    pub text_client: TextStructuredClient<TP>,
    pub image_client: ImageGenClient<IP>,
    pub style_dna_cache: Option<StyleDnaCache<VP>>,
    pub reference_index: Option<ReferenceIndex>,
}

impl<TP, VP, IP> PipelineRunner<TP, VP, IP>
where
    TP: TextProvider,
    VP: VisionProvider,
    IP: ImageGenProvider,
{
    pub fn new(config: Config, text_client: TextStructuredClient<TP>, image_client: ImageGenClient<IP>) -> Self {
        Self {
            config,
            text_client,
            image_client,
            style_dna_cache: None,
            reference_index: None,
        }
    }

    fn emit(&self, sink: &ProgressSink, stage: &str, item: Option<String>, status: EventStatus, started: Instant, detail: Option<String>) {
        sink.emit(PipelineEvent::new(stage, item, status, started.elapsed(), detail));
    }

    /// Phase 1: research (best-effort) → director → tag resolution →
    /// bounded logo fan-out.
    pub async fn run_logos_phase(
        &self,
        brief: &Brief,
        output_root: &Path,
        on_progress: ProgressSink,
        cancellation: Option<CancellationToken>,
    ) -> LogosPhaseResult {
        let mut state = PhaseState::Idle;
        log::debug!("logos phase -> {:?}", state);

        if is_cancelled(&cancellation) {
            return cancelled_logos_result(state.enter_cancelled());
        }

        // Research and the Director's research-independent prep (the
        // anti-cliché deny-list) run concurrently via `tokio::join!`; the
        // Director only waits on (research OR timeout) (§4.D).
        state = state.enter_researching();
        log::debug!("logos phase -> {:?}", state);
        let started = Instant::now();
        self.emit(&on_progress, "research", None, EventStatus::Started, started, None);
        let (research_summary, director_prep) = tokio::join!(
            research::run_research(&self.text_client, &self.config, brief),
            async { director::prepare(brief) },
        );
        self.emit(&on_progress, "research", None, EventStatus::Succeeded, started, None);

        if is_cancelled(&cancellation) {
            return cancelled_logos_result(state.enter_cancelled());
        }

        state = state.enter_directing();
        log::debug!("logos phase -> {:?}", state);
        let started = Instant::now();
        self.emit(&on_progress, "director", None, EventStatus::Started, started, None);
        let directions = match director::run_director(&self.text_client, brief, &research_summary, director_prep).await {
            Ok(output) => {
                self.emit(&on_progress, "director", None, EventStatus::Succeeded, started, None);
                output
            }
            Err(e) => {
                self.emit(&on_progress, "director", None, EventStatus::Failed, started, Some(e.to_string()));
                return failed_logos_result(state.enter_failed(), e);
            }
        };

        if is_cancelled(&cancellation) {
            return cancelled_logos_result(state.enter_cancelled());
        }

        state = state.enter_tagging();
        log::debug!("logos phase -> {:?}", state);
        let started = Instant::now();
        self.emit(&on_progress, "tag_resolver", None, EventStatus::Started, started, None);
        let tags_by_option = tag_resolver::resolve_tags(&self.text_client, brief, &directions).await;
        self.emit(&on_progress, "tag_resolver", None, EventStatus::Succeeded, started, None);

        if is_cancelled(&cancellation) {
            return cancelled_logos_result(state.enter_cancelled());
        }

        state = state.enter_generating_logos();
        log::debug!("logos phase -> {:?}", state);
        let started = Instant::now();
        self.emit(&on_progress, "logo_generator", None, EventStatus::Started, started, None);
        let (assets_by_option, per_direction_status) = logo_generator::generate_logos(
            directions.directions(),
            &tags_by_option,
            self.reference_index.as_ref(),
            self.style_dna_cache.as_ref(),
            brief,
            &self.image_client,
            output_root,
            self.config.max_logo_concurrency,
        )
        .await;

        for (option_number, status) in &per_direction_status {
            self.emit(
                &on_progress,
                "logo_generator",
                Some(option_number.to_string()),
                if status.is_ok() { EventStatus::Succeeded } else { EventStatus::Failed },
                started,
                match status {
                    AssetStatus::Failed { reason } => Some(reason.clone()),
                    _ => None,
                },
            );
        }

        let succeeded = per_direction_status.values().filter(|s| s.is_ok()).count();
        let total = per_direction_status.len();
        let phase_state = state.enter_done(succeeded, total);
        log::debug!("logos phase -> {:?}", phase_state);

        if succeeded == 0 {
            return LogosPhaseResult {
                success: false,
                directions: Some(directions),
                assets_by_option,
                per_direction_status,
                phase_state,
                error: Some("all four directions failed logo generation".to_string()),
            };
        }

        // P10: partial success (at least one direction generated) is
        // still a successful phase — the failed direction(s) are recorded
        // individually in `per_direction_status`, not surfaced as an
        // overall failure.
        LogosPhaseResult {
            success: true,
            directions: Some(directions),
            assets_by_option,
            per_direction_status,
            phase_state,
            error: None,
        }
    }

    /// Phase 1 refinement entry point: re-runs the Director only, given
    /// the previous output and user feedback (§4.E).
    pub async fn run_logos_refinement(
        &self,
        brief: &Brief,
        previous_output: &BrandDirectionsOutput,
        refinement_feedback: &str,
    ) -> Result<BrandDirectionsOutput, PipelineError> {
        director::run_director_refinement(&self.text_client, brief, previous_output, refinement_feedback).await
    }

    /// Phase 2: pattern, background, palette enrichment, shade scales,
    /// logo variants, mockups, social posts — for the chosen direction
    /// only (§4.H-J).
    pub async fn run_assets_phase(
        &self,
        directions: &BrandDirectionsOutput,
        chosen_option_number: u8,
        brief: &Brief,
        logo_path: &Path,
        mockup_zones: &[PlacementZone],
        output_dir: &Path,
        on_progress: ProgressSink,
        cancellation: Option<CancellationToken>,
    ) -> AssetsPhaseResult {
        let Some(direction) = directions.by_option_number(chosen_option_number) else {
            return AssetsPhaseResult {
                success: false,
                assets: Default::default(),
                mockups: vec![],
                social_posts: vec![],
                stylescape: None,
                per_asset_status: Default::default(),
                error: Some(format!("no direction with option_number {chosen_option_number}")),
            };
        };

        let mut per_asset_status = std::collections::BTreeMap::new();
        let tags = Vec::new();

        if is_cancelled(&cancellation) {
            return cancelled_assets_result();
        }

        let started = Instant::now();
        let (pattern_path, pattern_status) =
            asset_generator::generate_pattern(direction, self.reference_index.as_ref(), &tags, &self.image_client, output_dir)
                .await;
        self.emit(&on_progress, "asset_generator", Some("pattern".into()), status_event(&pattern_status), started, None);
        per_asset_status.insert("pattern".to_string(), pattern_status);

        if is_cancelled(&cancellation) {
            return cancelled_assets_result();
        }

        let started = Instant::now();
        let (background_path, background_status) =
            asset_generator::generate_background(direction, &self.image_client, output_dir).await;
        self.emit(&on_progress, "asset_generator", Some("background".into()), status_event(&background_status), started, None);
        per_asset_status.insert("background".to_string(), background_status);

        if is_cancelled(&cancellation) {
            return cancelled_assets_result();
        }

        let started = Instant::now();
        let enriched_colors = asset_generator::enrich_palette(direction, &self.text_client).await;
        self.emit(&on_progress, "asset_generator", Some("palette".into()), EventStatus::Succeeded, started, None);

        let palette_png = asset_generator::render_palette_png(&enriched_colors);
        let palette_path = output_dir.join("palette.png");
        let palette_status = match palette_png.save(&palette_path) {
            Ok(()) => AssetStatus::Ok,
            Err(e) => AssetStatus::Failed { reason: e.to_string() },
        };
        per_asset_status.insert("palette".to_string(), palette_status.clone());

        let shade_scales = asset_generator::compute_shade_scales(&enriched_colors);
        let _ = &shade_scales; // rendered by the caller's exporter; scales themselves are in-memory data

        if is_cancelled(&cancellation) {
            return cancelled_assets_result();
        }

        let started = Instant::now();
        let variants = asset_generator::derive_logo_variants(logo_path, output_dir, self.config.near_white_threshold).await;
        let (mut assets, variants_status) = match variants {
            Ok(assets) => (assets, AssetStatus::Ok),
            Err(e) => (Default::default(), AssetStatus::Failed { reason: e.to_string() }),
        };
        self.emit(&on_progress, "asset_generator", Some("logo_variants".into()), status_event(&variants_status), started, None);
        per_asset_status.insert("logo_variants".to_string(), variants_status);

        assets.pattern = pattern_path;
        assets.background = background_path;
        assets.palette_png = palette_status.is_ok().then_some(palette_path);
        assets.enriched_colors = enriched_colors.clone();

        let started = Instant::now();
        let stylescape_board = asset_generator::render_stylescape(
            assets.background.as_deref(),
            assets.logo_transparent.as_deref().or(assets.logo.as_deref()),
            &enriched_colors,
        )
        .await;
        let stylescape_path = output_dir.join("stylescape.png");
        let stylescape_status = match stylescape_board.save(&stylescape_path) {
            Ok(()) => AssetStatus::Ok,
            Err(e) => AssetStatus::Failed { reason: e.to_string() },
        };
        self.emit(&on_progress, "asset_generator", Some("stylescape".into()), status_event(&stylescape_status), started, None);
        let stylescape = stylescape_status.is_ok().then_some(stylescape_path);
        per_asset_status.insert("stylescape".to_string(), stylescape_status);

        if is_cancelled(&cancellation) {
            return cancelled_assets_result();
        }

        let started = Instant::now();
        let mockups_dir = output_dir.join("mockups");
        let _ = tokio::fs::create_dir_all(&mockups_dir).await;
        let mockups = mockup_compositor::composite_mockups(
            mockup_zones,
            &assets,
            &enriched_colors,
            &self.image_client,
            &mockups_dir,
            self.config.max_mockup_concurrency,
        )
        .await;
        for result in &mockups {
            self.emit(
                &on_progress,
                "mockup_compositor",
                Some(result.mockup_name.clone()),
                status_event(&result.status),
                started,
                None,
            );
        }

        if is_cancelled(&cancellation) {
            return cancelled_assets_result();
        }

        let started = Instant::now();
        let social_dir = output_dir.join("social");
        let _ = tokio::fs::create_dir_all(&social_dir).await;
        let (social_posts, social_statuses) = social_compositor::generate_social_posts(
            direction,
            brief,
            &assets,
            &self.image_client,
            &self.text_client,
            &social_dir,
        )
        .await;
        self.emit(&on_progress, "social_compositor", None, EventStatus::Succeeded, started, None);
        for (name, status) in social_statuses {
            per_asset_status.insert(format!("social:{name}"), status);
        }

        let primary_required_ok = per_asset_status
            .get("pattern")
            .map(|s| s.is_ok())
            .unwrap_or(false)
            && per_asset_status.get("logo_variants").map(|s| s.is_ok()).unwrap_or(false);

        AssetsPhaseResult {
            success: primary_required_ok,
            assets,
            mockups,
            social_posts,
            stylescape,
            per_asset_status,
            error: None,
        }
    }
}

fn status_event(status: &AssetStatus) -> EventStatus {
    match status {
        AssetStatus::Ok => EventStatus::Succeeded,
        AssetStatus::Failed { .. } => EventStatus::Failed,
        AssetStatus::Skipped { .. } => EventStatus::Skipped,
    }
}

fn failed_logos_result(phase_state: PhaseState, e: PipelineError) -> LogosPhaseResult {
    LogosPhaseResult {
        success: false,
        directions: None,
        assets_by_option: Default::default(),
        per_direction_status: Default::default(),
        phase_state,
        error: Some(e.to_string()),
    }
}

fn cancelled_logos_result(phase_state: PhaseState) -> LogosPhaseResult {
    LogosPhaseResult {
        success: false,
        directions: None,
        assets_by_option: Default::default(),
        per_direction_status: Default::default(),
        phase_state,
        error: Some(PipelineError::Cancelled.to_string()),
    }
}

fn cancelled_assets_result() -> AssetsPhaseResult {
    AssetsPhaseResult {
        success: false,
        assets: Default::default(),
        mockups: vec![],
        social_posts: vec![],
        stylescape: None,
        per_asset_status: Default::default(),
        error: Some(PipelineError::Cancelled.to_string()),
    }
}
