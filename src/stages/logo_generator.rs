//! Logo Generator (§4.G) — Phase 1, per-direction fan-out bounded to a
//! fixed worker-pool ceiling. The pool ceiling is a first-class resource
//! control (§5), not an incidental implementation detail — concurrent
//! task count never exceeds `max_concurrency`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::model_clients::{ImageGenClient, ImageGenProvider};
use crate::reference_index::{ReferenceIndex, ReferenceKind};
use crate::style_dna_extractor::StyleDnaCache;
use crate::model_clients::VisionProvider;
use crate::types::{AssetStatus, Brief, BrandDirection, DirectionAssets};

/// Compose the structured keyword prompt (~60-80 terms, not prose) for a
/// single direction's logo (§4.G step 3).
fn compose_prompt(
    direction: &BrandDirection,
    tags: &[String],
    styleguide_excerpt: Option<&str>,
    must_match_clause: Option<&str>,
) -> String {
    let spec = &direction.logo_spec;
    let mut parts = vec![
        format!("logo_type: {:?}", spec.logo_type),
        format!("form: {}", spec.form),
        format!("composition: {}", spec.composition),
        format!("color_hex: {}", spec.color_hex),
        format!("fill_style: {:?}", spec.fill_style),
        format!("stroke_weight: {}", spec.stroke_weight.as_str()),
        format!("typography_treatment: {}", spec.typography_treatment),
        format!("render_style: {}", spec.render_style),
        format!("metaphor: {}", spec.metaphor),
        format!("tags: {}", tags.join(", ")),
    ];
    if let Some(excerpt) = styleguide_excerpt {
        parts.push(format!("styleguide_excerpt: {excerpt}"));
    }
    if let Some(clause) = must_match_clause {
        parts.push(clause.to_string());
    }
    let mut avoid = vec![
        "text".to_string(),
        "cliche industry icons".to_string(),
        "gradients".to_string(),
        "drop shadows".to_string(),
        "3d effects".to_string(),
    ];
    avoid.extend(spec.avoid.iter().cloned());
    parts.push(format!("AVOID: {}", avoid.join(", ")));
    parts.join(" | ")
}

async fn load_attachments(paths: &[PathBuf]) -> Vec<Vec<u8>> {
    let mut bytes = Vec::with_capacity(paths.len());
    for path in paths {
        if let Ok(b) = tokio::fs::read(path).await {
            bytes.push(b);
        }
    }
    bytes
}

/// Generate one direction's logo: resolve tags, fetch references and
/// styleguide, extract Style-DNA for any style-ref images, assemble the
/// prompt, call `ImageGen`, and persist to `option_<N>_<slug>/logo.png`.
/// Never returns `Err` for generation failures: those are captured in the
/// returned `AssetStatus` so one direction's failure never blocks the
/// other three (§4.G, §7).
#[allow(clippy::too_many_arguments)]
async fn generate_one<IP, VP>(
    direction: &BrandDirection,
    tags: &[String],
    reference_index: Option<&ReferenceIndex>,
    style_dna_cache: Option<&StyleDnaCache<VP>>,
    brief: &Brief,
    image_client: &ImageGenClient<IP>,
    output_root: &Path,
) -> (DirectionAssets, AssetStatus)
where
    IP: ImageGenProvider,
    VP: VisionProvider,
{
    let references = reference_index
        .map(|idx| idx.lookup_references(tags, ReferenceKind::Logo, crate::config::REFERENCES_PER_DIRECTION))
        .unwrap_or_default();
    let styleguide = reference_index.and_then(|idx| idx.lookup_styleguide(tags, ReferenceKind::Logo));

    let mut must_match = None;
    if let Some(cache) = style_dna_cache {
        for style_ref in &brief.style_ref_images {
            if let Some(dna) = cache.extract(style_ref).await {
                must_match = Some(dna.must_match_clause());
                break;
            }
        }
    }

    let prompt = compose_prompt(direction, tags, styleguide, must_match.as_deref());

    let mut attachments = load_attachments(&references).await;
    attachments.extend(load_attachments(&brief.moodboard_images).await);
    attachments.extend(load_attachments(&brief.style_ref_images).await);

    let stage = format!("logo_generator:{}", direction.option_number);
    match image_client.generate(&stage, &prompt, &attachments).await {
        Ok(bytes) => {
            let dir_name = format!("option_{}_{}", direction.option_number, direction.slug());
            let dir_path = output_root.join(&dir_name);
            if let Err(e) = tokio::fs::create_dir_all(&dir_path).await {
                return (
                    DirectionAssets::default(),
                    AssetStatus::Failed { reason: e.to_string() },
                );
            }
            let logo_path = dir_path.join("logo.png");
            match tokio::fs::write(&logo_path, &bytes).await {
                Ok(()) => {
                    let assets = DirectionAssets {
                        logo: Some(logo_path),
                        ..Default::default()
                    };
                    (assets, AssetStatus::Ok)
                }
                Err(e) => (
                    DirectionAssets::default(),
                    AssetStatus::Failed { reason: e.to_string() },
                ),
            }
        }
        Err(e) => (DirectionAssets::default(), AssetStatus::Failed { reason: e.to_string() }),
    }
}

/// Run the logo generator over every direction, bounded to
/// `max_concurrency` in-flight generations at once (§4.G, §5).
pub async fn generate_logos<IP, VP>(
    directions: &[BrandDirection],
    tags_by_option: &BTreeMap<u8, Vec<String>>,
    reference_index: Option<&ReferenceIndex>,
    style_dna_cache: Option<&StyleDnaCache<VP>>,
    brief: &Brief,
    image_client: &ImageGenClient<IP>,
    output_root: &Path,
    max_concurrency: usize,
) -> (BTreeMap<u8, DirectionAssets>, BTreeMap<u8, AssetStatus>)
where
    IP: ImageGenProvider,
    VP: VisionProvider,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let empty_tags: Vec<String> = Vec::new();

    let results = futures::future::join_all(directions.iter().map(|direction| {
        let semaphore = semaphore.clone();
        let tags = tags_by_option.get(&direction.option_number).unwrap_or(&empty_tags);
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            let (assets, status) = generate_one(
                direction,
                tags,
                reference_index,
                style_dna_cache,
                brief,
                image_client,
                output_root,
            )
            .await;
            (direction.option_number, assets, status)
        }
    }))
    .await;

    let mut assets_by_option = BTreeMap::new();
    let mut status_by_option = BTreeMap::new();
    for (option_number, assets, status) in results {
        assets_by_option.insert(option_number, assets);
        status_by_option.insert(option_number, status);
    }
    (assets_by_option, status_by_option)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_clients::mock::MockImageGenProvider;
    use crate::types::{BackgroundSpec, ColorRole, ColorSwatch, FillStyle, LogoSpec, LogoType, PatternSpec, StrokeWeight};

    fn brief() -> Brief {
        Brief::new(
            "NuRange", "thermostats", "homeowners", "warm", vec![], "comfort",
            vec!["efficient".into()], vec![], vec![], None,
        )
        .unwrap()
    }

    fn direction(option_number: u8) -> BrandDirection {
        let colors = vec![
            ColorSwatch::new("#101010", ColorRole::Primary, "Ink").unwrap(),
            ColorSwatch::new("#F5F5F5", ColorRole::NeutralLight, "Paper").unwrap(),
            ColorSwatch::new("#202020", ColorRole::NeutralDark, "Charcoal").unwrap(),
        ];
        let logo_spec = LogoSpec::new(
            LogoType::AbstractMark, "an arc", "centered", "#101010", FillStyle::SolidFill,
            StrokeWeight::Medium, "custom sans", "flat vector", "comfort", vec![],
        )
        .unwrap();
        let pattern_spec =
            PatternSpec::new("arcs", "grid", vec!["#101010".into()], "sparse", "flat", vec![]).unwrap();
        let background_spec =
            BackgroundSpec::new("studio", vec!["#F5F5F5".into()], "calm", "flat", vec![]).unwrap();
        BrandDirection::new(
            option_number, "Northbound", "rationale", colors, "Custom Sans", "Custom Serif",
            "minimalist", logo_spec, pattern_spec, background_spec, "tagline", "slogan", "announcement",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn one_direction_failure_does_not_block_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let directions: Vec<_> = (1..=4).map(direction).collect();
        let mut tags = BTreeMap::new();
        for d in &directions {
            tags.insert(d.option_number, vec!["minimalist".to_string()]);
        }

        let provider = MockImageGenProvider {
            fail_models: vec!["image-primary".to_string(), "image-fallback".to_string()],
        };
        let image_client = ImageGenClient::new(
            provider,
            vec!["image-primary".to_string(), "image-fallback".to_string()],
        );

        let (assets, statuses) = generate_logos::<_, crate::model_clients::mock::NoopVisionProvider>(
            &directions,
            &tags,
            None,
            None,
            &brief(),
            &image_client,
            dir.path(),
            4,
        )
        .await;

        assert_eq!(assets.len(), 4);
        assert_eq!(statuses.len(), 4);
        for status in statuses.values() {
            assert!(matches!(status, AssetStatus::Failed { .. }));
        }
    }
}
