//! Asset Generator (§4.H) — Phase 2, sequential sub-steps for the
//! selected direction only. Each sub-step is isolated: a failure in one
//! is recorded in `per_asset_status` rather than aborting the others.

use std::collections::BTreeMap;
use std::path::Path;

use image::{GenericImageView, ImageBuffer, Rgba, RgbaImage};
use serde::Deserialize;

use crate::color::{hue_family, shade_scale, HueFamily};
use crate::model_clients::{ImageGenClient, ImageGenProvider, TextProvider, TextStructuredClient};
use crate::reference_index::{ReferenceIndex, ReferenceKind};
use crate::types::{AssetStatus, BrandDirection, ColorRole, ColorSwatch, DirectionAssets, HexColor};

const STAGE: &str = "asset_generator";

fn compose_pattern_prompt(direction: &BrandDirection, styleguide_excerpt: Option<&str>) -> String {
    let spec = &direction.pattern_spec;
    let mut parts = vec![
        format!("motif: {}", spec.motif),
        format!("layout: {}", spec.layout),
        format!(
            "colors: {}",
            spec.color_hexes.iter().map(|h| h.to_string()).collect::<Vec<_>>().join(", ")
        ),
        format!("density: {}", spec.density),
        format!("render_style: {}", spec.render_style),
    ];
    if let Some(excerpt) = styleguide_excerpt {
        parts.push(format!("styleguide_excerpt: {excerpt}"));
    }
    parts.push(format!("AVOID: {}", spec.avoid.join(", ")));
    parts.join(" | ")
}

fn compose_background_prompt(direction: &BrandDirection) -> String {
    let spec = &direction.background_spec;
    vec![
        format!("scene_description: {}", spec.scene_description),
        format!(
            "colors: {}",
            spec.color_hexes.iter().map(|h| h.to_string()).collect::<Vec<_>>().join(", ")
        ),
        format!("mood: {}", spec.mood),
        format!("render_style: {}", spec.render_style),
        format!("AVOID: {}", spec.avoid.join(", ")),
    ]
    .join(" | ")
}

async fn run_image_stage<IP: ImageGenProvider>(
    image_client: &ImageGenClient<IP>,
    stage: &str,
    prompt: &str,
    output_path: &Path,
) -> AssetStatus {
    match image_client.generate(stage, prompt, &[]).await {
        Ok(bytes) => match tokio::fs::write(output_path, &bytes).await {
            Ok(()) => AssetStatus::Ok,
            Err(e) => AssetStatus::Failed { reason: e.to_string() },
        },
        Err(e) => AssetStatus::Failed { reason: e.to_string() },
    }
}

/// Pattern sub-step (§4.H.1).
pub async fn generate_pattern<IP: ImageGenProvider>(
    direction: &BrandDirection,
    reference_index: Option<&ReferenceIndex>,
    tags: &[String],
    image_client: &ImageGenClient<IP>,
    output_dir: &Path,
) -> (Option<std::path::PathBuf>, AssetStatus) {
    let styleguide = reference_index.and_then(|idx| idx.lookup_styleguide(tags, ReferenceKind::Pattern));
    let prompt = compose_pattern_prompt(direction, styleguide);
    let path = output_dir.join("pattern.png");
    let status = run_image_stage(image_client, &format!("{STAGE}:pattern"), &prompt, &path).await;
    (status.is_ok().then_some(path), status)
}

/// Background sub-step (§4.H.2).
pub async fn generate_background<IP: ImageGenProvider>(
    direction: &BrandDirection,
    image_client: &ImageGenClient<IP>,
    output_dir: &Path,
) -> (Option<std::path::PathBuf>, AssetStatus) {
    let prompt = compose_background_prompt(direction);
    let path = output_dir.join("background.png");
    let status = run_image_stage(image_client, &format!("{STAGE}:background"), &prompt, &path).await;
    (status.is_ok().then_some(path), status)
}

#[derive(Debug, Deserialize)]
struct EnrichedColorName {
    hex: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct EnrichedColorsResponse {
    colors: Vec<EnrichedColorName>,
}

/// Palette enrichment sub-step (§4.H.3): name each color via a structured
/// call, then verify hue-family diversity algorithmically (the model may
/// propose redundant names but the diversity guarantee is enforced here,
/// not trusted from the model).
pub async fn enrich_palette<P: TextProvider>(
    direction: &BrandDirection,
    text_client: &TextStructuredClient<P>,
) -> Vec<ColorSwatch> {
    let prompt = format!(
        "Give each of these hex colors a short, evocative human-readable name: {}. \
         Respond as JSON: {{\"colors\": [{{\"hex\": \"#RRGGBB\", \"name\": \"...\"}}]}}.",
        direction
            .colors
            .iter()
            .map(|c| c.hex.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    );

    let names: BTreeMap<String, String> = text_client
        .call::<EnrichedColorsResponse>(&format!("{STAGE}:palette"), "You are a color namer.", &prompt)
        .await
        .map(|r| r.colors.into_iter().map(|c| (c.hex.to_uppercase(), c.name)).collect())
        .unwrap_or_default();

    direction
        .colors
        .iter()
        .map(|swatch| {
            let name = names
                .get(&swatch.hex.to_string().to_uppercase())
                .cloned()
                .unwrap_or_else(|| swatch.name.clone());
            ColorSwatch::new(swatch.hex.as_str(), swatch.role, name).unwrap_or_else(|_| swatch.clone())
        })
        .collect()
}

/// Whether a set of enriched colors covers at least two distinct hue
/// families, the diversity floor §4.H.3 expects palette enrichment to
/// preserve from the Director's own divergence rule.
pub fn hue_family_diversity(colors: &[ColorSwatch]) -> bool {
    let families: std::collections::HashSet<HueFamily> =
        colors.iter().map(|c| hue_family(&c.hex)).collect();
    families.len() >= 2
}

const SWATCH_SIZE: u32 = 120;
const SWATCH_GAP: u32 = 12;

/// Render a deterministic `palette.png` of labeled swatches (§4.H.3).
/// Labels themselves are not rasterized (no bundled font dependency);
/// the image communicates the palette via color blocks, and callers pair
/// it with the structured `colors[]` data for the human-readable names.
pub fn render_palette_png(colors: &[ColorSwatch]) -> RgbaImage {
    let width = colors.len() as u32 * (SWATCH_SIZE + SWATCH_GAP) + SWATCH_GAP;
    let height = SWATCH_SIZE + 2 * SWATCH_GAP;
    let mut canvas: RgbaImage = ImageBuffer::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    for (i, swatch) in colors.iter().enumerate() {
        let (r, g, b) = swatch.hex.rgb();
        let x0 = SWATCH_GAP + i as u32 * (SWATCH_SIZE + SWATCH_GAP);
        for dx in 0..SWATCH_SIZE {
            for dy in 0..SWATCH_SIZE {
                canvas.put_pixel(x0 + dx, SWATCH_GAP + dy, Rgba([r, g, b, 255]));
            }
        }
    }
    canvas
}

/// Shade-scale sub-step (§4.H.4): purely algorithmic, no model call.
pub fn compute_shade_scales(colors: &[ColorSwatch]) -> BTreeMap<ColorRole, Vec<(u16, HexColor)>> {
    colors
        .iter()
        .filter(|c| matches!(c.role, ColorRole::Primary | ColorRole::Secondary | ColorRole::Accent))
        .map(|c| (c.role, shade_scale(&c.hex)))
        .collect()
}

/// Desaturate then threshold to pure black/white (used to derive
/// `logo_black`).
fn desaturate_and_threshold(img: &image::DynamicImage, threshold: u8) -> RgbaImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = ImageBuffer::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let luma = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) as u8;
        let value = if luma >= threshold { 255 } else { 0 };
        out.put_pixel(x, y, Rgba([value, value, value, a]));
    }
    out
}

fn invert(img: &RgbaImage) -> RgbaImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = 255 - pixel.0[0];
        pixel.0[1] = 255 - pixel.0[1];
        pixel.0[2] = 255 - pixel.0[2];
    }
    out
}

/// Remove a near-white background by brightness threshold, producing an
/// alpha-keyed transparent variant. Known trade-off (§4.H.5): near-white
/// brand colors erode along with the background; recorded as a caveat,
/// not a blocker.
fn key_out_near_white(img: &image::DynamicImage, threshold: u8) -> RgbaImage {
    let rgba = img.to_rgba8();
    let mut out = rgba.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, _a] = pixel.0;
        if r >= threshold && g >= threshold && b >= threshold {
            pixel.0[3] = 0;
        }
    }
    out
}

const STYLESCAPE_WIDTH: u32 = 1600;
const STYLESCAPE_HEIGHT: u32 = 1000;
const STYLESCAPE_SWATCH_STRIP_HEIGHT: u32 = 140;

/// Best-effort moodboard-style board (§4.H.6): the direction's background
/// stretched to fill the canvas, its logo centered over it, and a palette
/// swatch strip along the bottom — purely pixel compositing of assets
/// this stage already produced, no model call of its own. Either input
/// missing or undecodable degrades to a blank layer rather than failing
/// the whole board, matching the rest of this module's stance on
/// sub-step isolation.
pub async fn render_stylescape(
    background_path: Option<&Path>,
    logo_path: Option<&Path>,
    colors: &[ColorSwatch],
) -> RgbaImage {
    let mut canvas: RgbaImage =
        ImageBuffer::from_pixel(STYLESCAPE_WIDTH, STYLESCAPE_HEIGHT, Rgba([255, 255, 255, 255]));
    let board_height = STYLESCAPE_HEIGHT - STYLESCAPE_SWATCH_STRIP_HEIGHT;

    if let Some(path) = background_path {
        if let Ok(bytes) = tokio::fs::read(path).await {
            if let Ok(bg) = image::load_from_memory(&bytes) {
                let resized = bg.resize_to_fill(STYLESCAPE_WIDTH, board_height, image::imageops::FilterType::Lanczos3);
                image::imageops::overlay(&mut canvas, &resized.to_rgba8(), 0, 0);
            }
        }
    }

    if let Some(path) = logo_path {
        if let Ok(bytes) = tokio::fs::read(path).await {
            if let Ok(logo) = image::load_from_memory(&bytes) {
                let max_dim = (board_height / 2).min(STYLESCAPE_WIDTH / 4);
                let resized = logo.resize(max_dim, max_dim, image::imageops::FilterType::Lanczos3);
                let x = ((STYLESCAPE_WIDTH - resized.width()) / 2) as i64;
                let y = ((board_height - resized.height()) / 2) as i64;
                image::imageops::overlay(&mut canvas, &resized.to_rgba8(), x, y);
            }
        }
    }

    if !colors.is_empty() {
        let swatch_width = STYLESCAPE_WIDTH / colors.len() as u32;
        for (i, swatch) in colors.iter().enumerate() {
            let (r, g, b) = swatch.hex.rgb();
            let x0 = i as u32 * swatch_width;
            for dx in 0..swatch_width {
                for dy in 0..STYLESCAPE_SWATCH_STRIP_HEIGHT {
                    canvas.put_pixel(x0 + dx, board_height + dy, Rgba([r, g, b, 255]));
                }
            }
        }
    }

    canvas
}

/// Logo-variants sub-step (§4.H.5): derive black, white, and transparent
/// variants from the base `logo.png`.
pub async fn derive_logo_variants(
    logo_path: &Path,
    output_dir: &Path,
    near_white_threshold: u8,
) -> Result<DirectionAssets, crate::error::PipelineError> {
    let bytes = tokio::fs::read(logo_path).await?;
    let img = image::load_from_memory(&bytes)?;

    let black = desaturate_and_threshold(&img, 128);
    let white = invert(&black);
    let transparent = key_out_near_white(&img, near_white_threshold);

    let black_path = output_dir.join("logo_black.png");
    let white_path = output_dir.join("logo_white.png");
    let transparent_path = output_dir.join("logo_transparent.png");

    black.save(&black_path)?;
    white.save(&white_path)?;
    transparent.save(&transparent_path)?;

    Ok(DirectionAssets {
        logo: Some(logo_path.to_path_buf()),
        logo_black: Some(black_path),
        logo_white: Some(white_path),
        logo_transparent: Some(transparent_path),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_family_diversity_detects_monochrome_palette() {
        let colors = vec![
            ColorSwatch::new("#101010", ColorRole::Primary, "Ink").unwrap(),
            ColorSwatch::new("#202020", ColorRole::NeutralDark, "Charcoal").unwrap(),
        ];
        assert!(!hue_family_diversity(&colors));
    }

    #[test]
    fn shade_scales_cover_primary_and_secondary_only() {
        let colors = vec![
            ColorSwatch::new("#3366CC", ColorRole::Primary, "Blue").unwrap(),
            ColorSwatch::new("#F5F5F5", ColorRole::NeutralLight, "Paper").unwrap(),
        ];
        let scales = compute_shade_scales(&colors);
        assert_eq!(scales.len(), 1);
        assert!(scales.contains_key(&ColorRole::Primary));
    }

    #[test]
    fn palette_png_width_scales_with_swatch_count() {
        let colors = vec![
            ColorSwatch::new("#3366CC", ColorRole::Primary, "Blue").unwrap(),
            ColorSwatch::new("#F5F5F5", ColorRole::NeutralLight, "Paper").unwrap(),
        ];
        let png = render_palette_png(&colors);
        assert_eq!(png.width(), 2 * (SWATCH_SIZE + SWATCH_GAP) + SWATCH_GAP);
    }

    #[tokio::test]
    async fn stylescape_renders_full_canvas_with_missing_inputs() {
        let colors = vec![
            ColorSwatch::new("#3366CC", ColorRole::Primary, "Blue").unwrap(),
            ColorSwatch::new("#F5F5F5", ColorRole::NeutralLight, "Paper").unwrap(),
        ];
        let board = render_stylescape(None, None, &colors).await;
        assert_eq!(board.width(), STYLESCAPE_WIDTH);
        assert_eq!(board.height(), STYLESCAPE_HEIGHT);
        let swatch_pixel = board.get_pixel(10, STYLESCAPE_HEIGHT - 10);
        assert_eq!(swatch_pixel.0, [0x33, 0x66, 0xCC, 255]);
    }

    #[tokio::test]
    async fn stylescape_overlays_background_and_logo_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let bg: RgbaImage = ImageBuffer::from_pixel(200, 150, Rgba([200, 50, 50, 255]));
        let bg_path = dir.path().join("background.png");
        bg.save(&bg_path).unwrap();
        let logo: RgbaImage = ImageBuffer::from_pixel(40, 40, Rgba([10, 200, 10, 255]));
        let logo_path = dir.path().join("logo.png");
        logo.save(&logo_path).unwrap();

        let board = render_stylescape(Some(&bg_path), Some(&logo_path), &[]).await;
        assert_eq!(board.width(), STYLESCAPE_WIDTH);
        let corner = board.get_pixel(2, 2);
        assert_eq!(corner.0, [200, 50, 50, 255]);
    }

    #[tokio::test]
    async fn derives_three_variants_from_a_base_logo() {
        let dir = tempfile::tempdir().unwrap();
        let base: RgbaImage = ImageBuffer::from_fn(64, 64, |x, _y| {
            if x < 32 {
                Rgba([10, 10, 10, 255])
            } else {
                Rgba([250, 250, 250, 255])
            }
        });
        let logo_path = dir.path().join("logo.png");
        base.save(&logo_path).unwrap();

        let assets = derive_logo_variants(&logo_path, dir.path(), 240).await.unwrap();
        assert!(assets.logo_black.is_some());
        assert!(assets.logo_white.is_some());
        assert!(assets.logo_transparent.is_some());

        let transparent = image::open(assets.logo_transparent.unwrap()).unwrap().to_rgba8();
        let near_white_pixel = transparent.get_pixel(40, 32);
        assert_eq!(near_white_pixel.0[3], 0);
    }
}
