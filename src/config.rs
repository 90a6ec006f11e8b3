//! Environment-driven configuration (§6): model endpoints/credentials are
//! opaque to the core and consumed by the model clients; everything else
//! here is a small set of tunables with documented defaults, read once at
//! startup via `std::env::var`.

use std::env;
use std::time::Duration;

/// Default worker-pool ceiling for Phase-1 logo generation (§4.G).
pub const DEFAULT_MAX_LOGO_CONCURRENCY: usize = 4;

/// Default worker-pool ceiling for Phase-2 mockup compositing (§4.I).
pub const DEFAULT_MAX_MOCKUP_CONCURRENCY: usize = 10;

/// Default hard cap on the Research stage (§4.D, §5).
pub const DEFAULT_RESEARCH_TIMEOUT_MS: u64 = 30_000;

/// Implicit per-attempt cap on every model call (§5).
pub const MODEL_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-mockup cap including retries (§5).
pub const MOCKUP_ITEM_TIMEOUT: Duration = Duration::from_secs(180);

/// Minimum number of attempts the retry policy must allow (§4.A).
pub const MIN_RETRY_ATTEMPTS: u32 = 3;

/// Number of reference logos/patterns fetched per direction (§4.G).
pub const REFERENCES_PER_DIRECTION: usize = 2;

#[derive(Debug, Clone)]
pub struct Config {
    pub max_logo_concurrency: usize,
    pub max_mockup_concurrency: usize,
    pub research_timeout: Duration,
    pub text_model: String,
    pub vision_model: String,
    pub image_model_ladder: Vec<String>,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub near_white_threshold: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_logo_concurrency: DEFAULT_MAX_LOGO_CONCURRENCY,
            max_mockup_concurrency: DEFAULT_MAX_MOCKUP_CONCURRENCY,
            research_timeout: Duration::from_millis(DEFAULT_RESEARCH_TIMEOUT_MS),
            text_model: "text-primary".to_string(),
            vision_model: "vision-primary".to_string(),
            image_model_ladder: vec!["image-primary".to_string(), "image-fallback".to_string()],
            api_key: None,
            api_base_url: None,
            near_white_threshold: 240,
        }
    }
}

impl Config {
    /// Build configuration from environment variables, falling back to the
    /// documented defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_logo_concurrency: env_usize("MAX_LOGO_CONCURRENCY", defaults.max_logo_concurrency),
            max_mockup_concurrency: env_usize(
                "MAX_MOCKUP_CONCURRENCY",
                defaults.max_mockup_concurrency,
            ),
            research_timeout: Duration::from_millis(env_u64(
                "RESEARCH_TIMEOUT_MS",
                DEFAULT_RESEARCH_TIMEOUT_MS,
            )),
            text_model: env::var("BRANDKIT_TEXT_MODEL").unwrap_or(defaults.text_model),
            vision_model: env::var("BRANDKIT_VISION_MODEL").unwrap_or(defaults.vision_model),
            image_model_ladder: env::var("BRANDKIT_IMAGE_MODEL_LADDER")
                .ok()
                .map(|s| s.split(',').map(|m| m.trim().to_string()).collect())
                .unwrap_or(defaults.image_model_ladder),
            api_key: env::var("BRANDKIT_API_KEY").ok(),
            api_base_url: env::var("BRANDKIT_API_BASE_URL").ok(),
            near_white_threshold: env_usize("BRANDKIT_NEAR_WHITE_THRESHOLD", 240) as u8,
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
