//! Stage output payloads: `DirectionAssets`, `LogosPhaseResult`,
//! `AssetsPhaseResult`, and the per-direction status records the runner
//! reports alongside them (§3, §4.K, §7).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::color::ColorSwatch;
use super::direction::BrandDirectionsOutput;

/// Per-direction or per-asset outcome, recorded rather than propagated as
/// an error (§7 "partial success is always preferred to abort").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetStatus {
    Ok,
    Failed { reason: String },
    Skipped { reason: String },
}

impl AssetStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, AssetStatus::Ok)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionAssets {
    pub logo: Option<PathBuf>,
    pub logo_white: Option<PathBuf>,
    pub logo_black: Option<PathBuf>,
    pub logo_transparent: Option<PathBuf>,
    pub pattern: Option<PathBuf>,
    pub background: Option<PathBuf>,
    pub palette_png: Option<PathBuf>,
    pub shades_png: Option<PathBuf>,
    pub enriched_colors: Vec<ColorSwatch>,
}

impl DirectionAssets {
    /// Pick the logo variant appropriate for a mockup's darkness class
    /// (§4.I step 3): dark backgrounds want `logo_white`; everything else
    /// wants `logo_transparent`, falling back to the plain `logo`.
    pub fn variant_for_darkness(&self, is_dark_background: bool) -> Option<&PathBuf> {
        if is_dark_background {
            self.logo_white.as_ref().or(self.logo.as_ref())
        } else {
            self.logo_transparent.as_ref().or(self.logo.as_ref())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogosPhaseResult {
    pub success: bool,
    /// `None` only when the phase failed before the Director produced a
    /// valid output (fatal `DirectorOutputInvalid`) or was cancelled
    /// beforehand; callers must check `error` before reading this back.
    pub directions: Option<BrandDirectionsOutput>,
    pub assets_by_option: BTreeMap<u8, DirectionAssets>,
    pub per_direction_status: BTreeMap<u8, AssetStatus>,
    /// The terminal (or, on an early return, last-reached) §4.K state —
    /// genuinely carried through from the runner's state machine rather
    /// than logged and discarded, so a UI caller can render it without
    /// inferring it from `success`/`error` alone.
    pub phase_state: crate::runner::PhaseState,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockupResult {
    pub mockup_name: String,
    pub output_path: Option<PathBuf>,
    pub status: AssetStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsPhaseResult {
    pub success: bool,
    pub assets: DirectionAssets,
    pub mockups: Vec<MockupResult>,
    pub social_posts: Vec<PathBuf>,
    pub stylescape: Option<PathBuf>,
    pub per_asset_status: BTreeMap<String, AssetStatus>,
    pub error: Option<String>,
}
