//! Director Stage (§4.E) — a single structured call producing exactly
//! four brand directions, self-enforcing the anti-cliché, copy-override,
//! and divergence rules before the result is handed downstream.

use std::collections::HashSet;

use crate::color::hue_family;
use crate::error::PipelineError;
use crate::model_clients::{TextProvider, TextStructuredClient};
use crate::stages::research::ResearchSummary;
use crate::types::{Brief, BrandDirection, BrandDirectionsOutput};

const MAX_DIRECTOR_REPAIR_ATTEMPTS: u32 = 2;

/// Per-industry deny-lists for the anti-cliché rule. Matched against each
/// direction's `logo_spec.form`/`metaphor` case-insensitively whenever a
/// deny-list's industry keyword appears anywhere in the brief.
const INDUSTRY_DENY_LISTS: &[(&str, &[&str])] = &[
    ("coffee", &["coffee bean", "mug", "steam"]),
    ("tech", &["circuit board", "gear", "lightbulb"]),
    ("finance", &["dollar sign", "piggy bank", "handshake"]),
    ("fitness", &["dumbbell", "flexed bicep"]),
    ("legal", &["scales of justice", "gavel"]),
    ("health", &["red cross", "stethoscope"]),
    ("food", &["chef hat", "fork and knife"]),
    ("real estate", &["house silhouette", "key icon"]),
];

fn applicable_deny_list(brief: &Brief) -> Vec<&'static str> {
    let haystack = format!(
        "{} {} {}",
        brief.product_description,
        brief.core_promise,
        brief.keywords.join(" ")
    )
    .to_lowercase();

    INDUSTRY_DENY_LISTS
        .iter()
        .filter(|(industry, _)| haystack.contains(industry))
        .flat_map(|(_, terms)| terms.iter().copied())
        .collect()
}

/// P4: no two directions may share both the same primary-color hue family
/// and the same `logo_type`.
fn divergence_violation(directions: &[BrandDirection]) -> Option<String> {
    let mut seen = HashSet::new();
    for d in directions {
        let Some(primary) = d.primary_color() else {
            continue;
        };
        let key = (hue_family(&primary.hex), d.logo_spec.logo_type);
        if !seen.insert(key) {
            return Some(format!(
                "direction {} repeats hue family + logo_type already used by another direction",
                d.option_number
            ));
        }
    }
    None
}

fn cliche_violation(directions: &[BrandDirection], deny_list: &[&str]) -> Option<String> {
    if deny_list.is_empty() {
        return None;
    }
    directions.iter().find_map(|d| {
        d.logo_spec
            .contains_cliche(deny_list)
            .map(|term| format!("direction {} uses denied term '{term}'", d.option_number))
    })
}

fn director_system_prompt() -> &'static str {
    "You are the Creative Director. Produce exactly four brand directions in the fixed \
     position order (1: Market-Aligned, 2: Designer-Led, 3: Hybrid, 4: Wild-Card). Each \
     direction's colors must include primary, neutral-dark, and neutral-light roles. Do not \
     use industry-cliché imagery. No two directions may share both the same primary color's \
     hue family and the same logo type. If the brief locks any copy fields, reproduce them \
     verbatim in every direction. Respond with JSON only: {\"directions\": [...]}."
}

fn initial_user_prompt(brief: &Brief, research: &ResearchSummary) -> String {
    let research_block = if research.is_empty() {
        "No research summary is available.".to_string()
    } else {
        format!(
            "Research summary:\npositioning: {}\ndesign language: {}\ncommon tropes: {}",
            research.positioning.join("; "),
            research.design_language_observations.join("; "),
            research.common_visual_tropes.join("; "),
        )
    };

    format!(
        "Brand name: {}\nProduct: {}\nAudience: {}\nTone: {}\nCore promise: {}\nKeywords: {}\n\n{}",
        brief.brand_name,
        brief.product_description,
        brief.target_audience,
        brief.tone,
        brief.core_promise,
        brief.keywords.join(", "),
        research_block,
    )
}

async fn direct_with_prompt<P: TextProvider>(
    client: &TextStructuredClient<P>,
    brief: &Brief,
    deny_list: &[&str],
    mut user_prompt: String,
) -> Result<BrandDirectionsOutput, PipelineError> {
    let mut last_reason = String::new();

    for _attempt in 0..=MAX_DIRECTOR_REPAIR_ATTEMPTS {
        let raw: BrandDirectionsOutput = client
            .call("director", director_system_prompt(), &user_prompt)
            .await?;
        let directions = raw.into_directions();

        let violation = cliche_violation(&directions, deny_list)
            .or_else(|| divergence_violation(&directions));

        match violation {
            None => match BrandDirectionsOutput::new(directions) {
                Ok(validated) => {
                    if let Some(locked) = brief.locked_copy.clone() {
                        if !locked.is_empty() {
                            validated
                                .enforce_locked_copy(&locked)
                                .map_err(|e| PipelineError::DirectorOutputInvalid(e.to_string()))?;
                        }
                    }
                    return Ok(validated);
                }
                Err(e) => {
                    last_reason = e.to_string();
                }
            },
            Some(reason) => {
                last_reason = reason;
            }
        }

        user_prompt = format!(
            "{user_prompt}\n\nYour previous response violated a hard constraint: \
             {last_reason}. Regenerate all four directions honoring every rule."
        );
    }

    Err(PipelineError::DirectorOutputInvalid(last_reason))
}

/// The part of Phase-1 director prep that doesn't depend on the research
/// result — the anti-cliché deny-list derived purely from the brief. Run
/// via `tokio::join!` alongside the Research call (§4.D) so its (small but
/// nonzero) cost never sits behind research latency.
pub struct DirectorPrep {
    deny_list: Vec<&'static str>,
}

/// Compute the research-independent half of director prep. Synchronous,
/// but called from an `async` block at the `tokio::join!` call site so it
/// genuinely runs alongside the Research future rather than after it.
pub fn prepare(brief: &Brief) -> DirectorPrep {
    DirectorPrep {
        deny_list: applicable_deny_list(brief),
    }
}

/// Initial Phase-1 call: produce the four directions from scratch.
pub async fn run_director<P: TextProvider>(
    client: &TextStructuredClient<P>,
    brief: &Brief,
    research: &ResearchSummary,
    prep: DirectorPrep,
) -> Result<BrandDirectionsOutput, PipelineError> {
    let prompt = initial_user_prompt(brief, research);
    direct_with_prompt(client, brief, &prep.deny_list, prompt).await
}

/// Refinement call: regenerate directions in light of `refinement_feedback`,
/// preserving option-type ordering (§4.E).
pub async fn run_director_refinement<P: TextProvider>(
    client: &TextStructuredClient<P>,
    brief: &Brief,
    previous_output: &BrandDirectionsOutput,
    refinement_feedback: &str,
) -> Result<BrandDirectionsOutput, PipelineError> {
    let deny_list = applicable_deny_list(brief);
    let previous_json = serde_json::to_string_pretty(previous_output)
        .map_err(|e| PipelineError::DirectorOutputInvalid(e.to_string()))?;
    let prompt = format!(
        "Previous directions:\n{previous_json}\n\nUser refinement feedback: {refinement_feedback}\n\n\
         Regenerate all four directions (or only the ones the feedback targets), preserving \
         the option-type ordering."
    );
    direct_with_prompt(client, brief, &deny_list, prompt).await
}
