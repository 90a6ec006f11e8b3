//! Mockup Compositor (§4.I) — applies the chosen direction's assets onto
//! ~10 product-photo mockups in parallel, bounded to a worker-pool
//! ceiling sized to `min(mockup_count, MAX_MOCKUP_CONCURRENCY)`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::config::MOCKUP_ITEM_TIMEOUT;
use crate::model_clients::{ImageGenClient, ImageGenProvider};
use crate::types::{AssetStatus, ColorSwatch, DirectionAssets, MockupResult};

/// Mockups composited against a dark-background surface use `logo_white`
/// per §4.I step 3's explicit set.
const DARK_BACKGROUND_MOCKUPS: &[&str] = &[
    "tote_bag",
    "black_tshirt",
    "employee_id_card",
    "dark_hoodie",
    "matte_black_mug",
];

fn is_dark_background(mockup_name: &str) -> bool {
    DARK_BACKGROUND_MOCKUPS.contains(&mockup_name)
}

/// Pre-extracted placement-zone metadata for one mockup, produced during
/// reference-library construction (§4.I step 2). The runtime never
/// re-detects zones; it only reads this record.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacementZone {
    pub mockup_name: String,
    pub original_photo: PathBuf,
    pub zone_description: String,
}

fn compose_mockup_prompt(zone: &PlacementZone, colors: &[ColorSwatch]) -> String {
    format!(
        "Apply the brand logo onto the product photo. placement_zone: {} | brand_colors: {}",
        zone.zone_description,
        colors.iter().map(|c| c.hex.to_string()).collect::<Vec<_>>().join(", "),
    )
}

async fn composite_one<IP: ImageGenProvider>(
    zone: &PlacementZone,
    assets: &DirectionAssets,
    colors: &[ColorSwatch],
    image_client: &ImageGenClient<IP>,
    output_dir: &Path,
) -> MockupResult {
    if !zone.original_photo.is_file() {
        return MockupResult {
            mockup_name: zone.mockup_name.clone(),
            output_path: None,
            status: AssetStatus::Skipped {
                reason: format!("original photo missing: {}", zone.original_photo.display()),
            },
        };
    }

    let Some(logo_variant) = assets.variant_for_darkness(is_dark_background(&zone.mockup_name)) else {
        return MockupResult {
            mockup_name: zone.mockup_name.clone(),
            output_path: None,
            status: AssetStatus::Skipped {
                reason: "no logo variant available".to_string(),
            },
        };
    };

    let mut attachments = Vec::new();
    if let Ok(photo_bytes) = tokio::fs::read(&zone.original_photo).await {
        attachments.push(photo_bytes);
    }
    if let Ok(logo_bytes) = tokio::fs::read(logo_variant).await {
        attachments.push(logo_bytes);
    }

    let prompt = compose_mockup_prompt(zone, colors);
    let stage = format!("mockup_compositor:{}", zone.mockup_name);
    let call = image_client.generate(&stage, &prompt, &attachments);

    let result = tokio::time::timeout(MOCKUP_ITEM_TIMEOUT, call).await;
    match result {
        Ok(Ok(bytes)) => {
            let output_path = output_dir.join(format!("{}_composite.png", zone.mockup_name));
            match tokio::fs::write(&output_path, &bytes).await {
                Ok(()) => MockupResult {
                    mockup_name: zone.mockup_name.clone(),
                    output_path: Some(output_path),
                    status: AssetStatus::Ok,
                },
                Err(e) => MockupResult {
                    mockup_name: zone.mockup_name.clone(),
                    output_path: None,
                    status: AssetStatus::Failed { reason: e.to_string() },
                },
            }
        }
        Ok(Err(e)) => MockupResult {
            mockup_name: zone.mockup_name.clone(),
            output_path: None,
            status: AssetStatus::Failed { reason: e.to_string() },
        },
        Err(_) => MockupResult {
            mockup_name: zone.mockup_name.clone(),
            output_path: None,
            status: AssetStatus::Failed {
                reason: format!("timed out after {:?}", MOCKUP_ITEM_TIMEOUT),
            },
        },
    }
}

/// Composite every mockup, bounded to `min(zones.len(), max_concurrency)`
/// concurrent in-flight generations (§5).
pub async fn composite_mockups<IP: ImageGenProvider>(
    zones: &[PlacementZone],
    assets: &DirectionAssets,
    colors: &[ColorSwatch],
    image_client: &ImageGenClient<IP>,
    output_dir: &Path,
    max_concurrency: usize,
) -> Vec<MockupResult> {
    let pool_size = zones.len().min(max_concurrency).max(1);
    let semaphore = Arc::new(Semaphore::new(pool_size));

    futures::future::join_all(zones.iter().map(|zone| {
        let semaphore = semaphore.clone();
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            composite_one(zone, assets, colors, image_client, output_dir).await
        }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_clients::mock::MockImageGenProvider;
    use crate::types::ColorRole;

    fn colors() -> Vec<ColorSwatch> {
        vec![ColorSwatch::new("#101010", ColorRole::Primary, "Ink").unwrap()]
    }

    #[tokio::test]
    async fn skips_mockup_with_missing_photo() {
        let dir = tempfile::tempdir().unwrap();
        let zone = PlacementZone {
            mockup_name: "tote_bag".to_string(),
            original_photo: dir.path().join("nonexistent.jpg"),
            zone_description: "front panel".to_string(),
        };
        let provider = MockImageGenProvider { fail_models: vec![] };
        let client = ImageGenClient::new(provider, vec!["image-primary".to_string()]);
        let assets = DirectionAssets::default();

        let results = composite_mockups(&[zone], &assets, &colors(), &client, dir.path(), 10).await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].status, AssetStatus::Skipped { .. }));
    }

    #[tokio::test]
    async fn dark_background_mockup_uses_white_variant() {
        let dir = tempfile::tempdir().unwrap();
        let photo_path = dir.path().join("tote.jpg");
        tokio::fs::write(&photo_path, b"fake jpeg bytes").await.unwrap();
        let logo_white_path = dir.path().join("logo_white.png");
        tokio::fs::write(&logo_white_path, b"fake png bytes").await.unwrap();

        let zone = PlacementZone {
            mockup_name: "tote_bag".to_string(),
            original_photo: photo_path,
            zone_description: "front panel".to_string(),
        };
        let provider = MockImageGenProvider { fail_models: vec![] };
        let client = ImageGenClient::new(provider, vec!["image-primary".to_string()]);
        let assets = DirectionAssets {
            logo_white: Some(logo_white_path),
            ..Default::default()
        };

        let results = composite_mockups(&[zone], &assets, &colors(), &client, dir.path(), 10).await;
        assert!(matches!(results[0].status, AssetStatus::Ok));
        assert!(results[0].output_path.is_some());
    }
}
