//! Structural contract for pattern styleguide documents (§6, P6).
//!
//! The original source extracted `Dominant Motif Types` / `Rendering` /
//! `Vibe` fields with a fragile ad hoc regex at prompt-assembly time. Here
//! the format is treated as a contract validated once at load time:
//! non-conformant documents fail loudly via `StyleguideNonConformant`
//! rather than silently dropping a field three stages later.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PipelineError;

static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^###\s*For PATTERNS:").unwrap());
static MOTIF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*Dominant Motif Types\*\*:").unwrap());
static RENDERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*Rendering(?: Style)?\*\*:").unwrap());
static VIBE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(?:Vibe|Mood)\*\*:").unwrap());
static AVOID_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\d+\.\s*Avoid\s*$").unwrap());
static BULLET_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[-*]\s+\S").unwrap());

/// Fields extracted from a single numbered section of a pattern styleguide.
#[derive(Debug, Clone)]
pub struct PatternStyleSection {
    pub dominant_motif_types: String,
    pub rendering: String,
    pub vibe: String,
}

/// Validate a pattern styleguide document against the documented contract:
/// a `### For PATTERNS:` header, at least one numbered section carrying
/// `Dominant Motif Types` / `Rendering`(` Style`) / `Vibe`|`Mood` fields,
/// and a trailing numbered `Avoid` section followed by bullet items.
pub fn validate_pattern_styleguide(path: &Path, text: &str) -> Result<(), PipelineError> {
    let fail = |reason: &str| PipelineError::StyleguideNonConformant {
        path: path.display().to_string(),
        reason: reason.to_string(),
    };

    if !HEADER.is_match(text) {
        return Err(fail("missing '### For PATTERNS:' header"));
    }
    if !MOTIF.is_match(text) {
        return Err(fail("missing '**Dominant Motif Types**:' field"));
    }
    if !RENDERING.is_match(text) {
        return Err(fail("missing '**Rendering**:' or '**Rendering Style**:' field"));
    }
    if !VIBE.is_match(text) {
        return Err(fail("missing '**Vibe**:' or '**Mood**:' field"));
    }

    let avoid_match = AVOID_SECTION
        .find(text)
        .ok_or_else(|| fail("missing numbered 'Avoid' section"))?;
    let after_avoid = &text[avoid_match.end()..];
    if !BULLET_LINE.is_match(after_avoid) {
        return Err(fail("'Avoid' section has no bullet items"));
    }

    Ok(())
}

/// Extract the three fields from the first conforming section of a
/// document already validated by [`validate_pattern_styleguide`].
pub fn extract_first_section(text: &str) -> Option<PatternStyleSection> {
    let motif = MOTIF.find(text)?;
    let rendering = RENDERING.find(text)?;
    let vibe = VIBE.find(text)?;

    let field_value = |re_end: usize| -> String {
        text[re_end..]
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string()
    };

    Some(PatternStyleSection {
        dominant_motif_types: field_value(motif.end()),
        rendering: field_value(rendering.end()),
        vibe: field_value(vibe.end()),
    })
}
