//! Research Stage (§4.D) — best-effort, time-boxed market context.
//!
//! Runs concurrently with the Director's prompt assembly; the Director
//! only ever waits for (research OR timeout), never blocks on it.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::model_clients::{TextProvider, TextStructuredClient};
use crate::types::Brief;

/// Competitor-landscape summary. Every field is best-effort free text;
/// an empty record (all fields empty) is a valid, expected outcome on
/// timeout or failure, not an error condition the Director needs to
/// special-case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchSummary {
    #[serde(default)]
    pub positioning: Vec<String>,
    #[serde(default)]
    pub design_language_observations: Vec<String>,
    #[serde(default)]
    pub common_visual_tropes: Vec<String>,
}

impl ResearchSummary {
    pub fn is_empty(&self) -> bool {
        self.positioning.is_empty()
            && self.design_language_observations.is_empty()
            && self.common_visual_tropes.is_empty()
    }
}

fn research_prompt(brief: &Brief) -> String {
    format!(
        "Summarize the competitive and design landscape for a brand with the following brief.\n\
         Brand name: {}\nProduct: {}\nAudience: {}\nTone: {}\nCompetitors: {}\nCore promise: {}\n\n\
         Respond as JSON with fields: positioning (array of strings), \
         design_language_observations (array of strings), common_visual_tropes (array of strings).",
        brief.brand_name,
        brief.product_description,
        brief.target_audience,
        brief.tone,
        brief.competitors.join(", "),
        brief.core_promise,
    )
}

/// Run the research call under the configured hard timeout. On timeout or
/// any failure, returns an empty summary rather than propagating an
/// error — Research is advisory, never fatal to the phase.
pub async fn run_research<P: TextProvider>(
    client: &TextStructuredClient<P>,
    config: &Config,
    brief: &Brief,
) -> ResearchSummary {
    let prompt = research_prompt(brief);
    let call = client.call::<ResearchSummary>(
        "research",
        "You are a market research analyst producing a brief, structured competitive summary.",
        &prompt,
    );

    match tokio::time::timeout(config.research_timeout, call).await {
        Ok(Ok(summary)) => summary,
        Ok(Err(e)) => {
            log::info!("research stage degraded: {e}");
            ResearchSummary::default()
        }
        Err(_) => {
            log::info!("research stage timed out after {:?}", config.research_timeout);
            ResearchSummary::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_clients::mock::{MockTextProvider, SlowTextProvider};
    use serde_json::json;
    use std::time::Duration;

    fn brief() -> Brief {
        Brief::new(
            "NuRange",
            "smart thermostats",
            "eco-conscious homeowners",
            "warm, confident",
            vec!["Nest".into()],
            "comfort without waste",
            vec!["efficient".into()],
            vec![],
            vec![],
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn returns_summary_on_success() {
        let provider = MockTextProvider::new(vec![json!({
            "positioning": ["mid-market, sustainability-led"],
            "design_language_observations": ["soft gradients, rounded corners"],
            "common_visual_tropes": ["leaf iconography"]
        })]);
        let client = TextStructuredClient::new(provider);
        let config = Config::default();
        let summary = run_research(&client, &config, &brief()).await;
        assert!(!summary.is_empty());
        assert_eq!(summary.positioning.len(), 1);
    }

    #[tokio::test]
    async fn degrades_to_empty_on_timeout() {
        let provider = SlowTextProvider {
            delay: Duration::from_millis(200),
        };
        let client = TextStructuredClient::new(provider);
        let mut config = Config::default();
        config.research_timeout = Duration::from_millis(10);
        let summary = run_research(&client, &config, &brief()).await;
        assert!(summary.is_empty());
    }

    #[tokio::test]
    async fn degrades_to_empty_on_provider_failure() {
        let provider = MockTextProvider::new(vec![]);
        let client = TextStructuredClient::new(provider);
        let config = Config::default();
        let summary = run_research(&client, &config, &brief()).await;
        assert!(summary.is_empty());
    }
}
