//! Social Compositor (§4.J) — generates fixed-aspect social posts for
//! the chosen direction, resolving each copy field through a three-tier
//! priority chain.

use std::path::{Path, PathBuf};

use crate::model_clients::{ImageGenClient, ImageGenProvider, TextProvider, TextStructuredClient};
use crate::types::{AssetStatus, Brief, BrandDirection, DirectionAssets};

const STAGE: &str = "social_compositor";

/// One post format to generate, paired with its fixed aspect ratio label
/// used only in the prompt (not enforced pixel-wise, §4.J).
struct PostFormat {
    file_name: &'static str,
    aspect_label: &'static str,
}

const POST_FORMATS: &[PostFormat] = &[
    PostFormat { file_name: "ig_post.png", aspect_label: "1:1" },
    PostFormat { file_name: "ig_story.png", aspect_label: "9:16" },
    PostFormat { file_name: "fb_post.png", aspect_label: "16:9" },
    PostFormat { file_name: "x_post.png", aspect_label: "16:9" },
    PostFormat { file_name: "linkedin_post.png", aspect_label: "1:1" },
];

/// Resolve copy through the priority chain (§4.J): locked copy first,
/// then the direction's own field, then an on-the-fly fallback call.
async fn resolve_copy<P: TextProvider>(
    direction: &BrandDirection,
    brief: &Brief,
    text_client: &TextStructuredClient<P>,
) -> String {
    let locked = brief.locked_copy();
    if let Some(tagline) = locked.tagline {
        return tagline;
    }
    if !direction.tagline.trim().is_empty() {
        return direction.tagline.clone();
    }

    #[derive(serde::Deserialize)]
    struct CopyResponse {
        copy: String,
    }

    let prompt = format!(
        "Write a short social caption for {} ({}). Audience: {}. Tone: {}. Respond as JSON: \
         {{\"copy\": \"...\"}}.",
        brief.brand_name, brief.product_description, brief.target_audience, brief.tone,
    );
    text_client
        .call::<CopyResponse>(&format!("{STAGE}:copy_fallback"), "You are a social copywriter.", &prompt)
        .await
        .map(|r| r.copy)
        .unwrap_or_else(|_| brief.brand_name.clone())
}

async fn generate_one<IP: ImageGenProvider>(
    format: &PostFormat,
    direction: &BrandDirection,
    assets: &DirectionAssets,
    copy: &str,
    image_client: &ImageGenClient<IP>,
    output_dir: &Path,
) -> (PathBuf, AssetStatus) {
    let mut attachments = Vec::new();
    if let Some(logo) = assets.logo_transparent.as_ref().or(assets.logo.as_ref()) {
        if let Ok(bytes) = tokio::fs::read(logo).await {
            attachments.push(bytes);
        }
    }

    let prompt = format!(
        "Compose a {} social post for {} featuring the logo with safe-area padding. \
         graphic_style: {} | copy: {}",
        format.aspect_label, direction.direction_name, direction.graphic_style, copy,
    );

    let path = output_dir.join(format.file_name);
    let stage = format!("{STAGE}:{}", format.file_name);
    match image_client.generate(&stage, &prompt, &attachments).await {
        Ok(bytes) => match tokio::fs::write(&path, &bytes).await {
            Ok(()) => (path, AssetStatus::Ok),
            Err(e) => (path, AssetStatus::Failed { reason: e.to_string() }),
        },
        Err(e) => (path, AssetStatus::Failed { reason: e.to_string() }),
    }
}

/// Generate every social post format, returning the paths that succeeded
/// alongside a per-format status record.
pub async fn generate_social_posts<IP: ImageGenProvider, TP: TextProvider>(
    direction: &BrandDirection,
    brief: &Brief,
    assets: &DirectionAssets,
    image_client: &ImageGenClient<IP>,
    text_client: &TextStructuredClient<TP>,
    output_dir: &Path,
) -> (Vec<PathBuf>, std::collections::BTreeMap<String, AssetStatus>) {
    let copy = resolve_copy(direction, brief, text_client).await;

    let mut posts = Vec::new();
    let mut statuses = std::collections::BTreeMap::new();
    for format in POST_FORMATS {
        let (path, status) = generate_one(format, direction, assets, &copy, image_client, output_dir).await;
        if status.is_ok() {
            posts.push(path);
        }
        statuses.insert(format.file_name.to_string(), status);
    }
    (posts, statuses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_clients::mock::{MockImageGenProvider, MockTextProvider};
    use crate::types::{BackgroundSpec, ColorRole, ColorSwatch, FillStyle, LogoSpec, LogoType, LockedCopy, PatternSpec, StrokeWeight};

    fn direction() -> BrandDirection {
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
            1, "Northbound", "rationale", colors, "Custom Sans", "Custom Serif",
            "minimalist", logo_spec, pattern_spec, background_spec, "Always ahead.", "slogan", "announcement",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn locked_copy_takes_priority_over_direction_tagline() {
        let brief = Brief::new(
            "NuRange", "thermostats", "homeowners", "warm", vec![], "comfort",
            vec![], vec![], vec![],
            Some(LockedCopy {
                tagline: Some("Locked tagline.".to_string()),
                slogan: None,
                announcement: None,
            }),
        )
        .unwrap();

        let image_provider = MockImageGenProvider { fail_models: vec![] };
        let image_client = ImageGenClient::new(image_provider, vec!["image-primary".to_string()]);
        let text_provider = MockTextProvider::new(vec![]);
        let text_client = TextStructuredClient::new(text_provider);

        let copy = resolve_copy(&direction(), &brief, &text_client).await;
        assert_eq!(copy, "Locked tagline.");

        let dir = tempfile::tempdir().unwrap();
        let (posts, statuses) =
            generate_social_posts(&direction(), &brief, &DirectionAssets::default(), &image_client, &text_client, dir.path())
                .await;
        assert_eq!(posts.len(), POST_FORMATS.len());
        assert_eq!(statuses.len(), POST_FORMATS.len());
    }
}
