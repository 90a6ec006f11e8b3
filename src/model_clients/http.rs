//! Generic `reqwest`-backed providers for the three capability contracts:
//! a single `reqwest::Client`, bearer-style auth header, JSON body,
//! status-code-driven error classification. The model providers
//! themselves are out of scope for this crate (§1) — this is deliberately
//! a provider-agnostic HTTP shape (one JSON endpoint per capability,
//! parameterized by model id) rather than a binding to any one vendor's
//! wire format, so swapping in a concrete vendor adapter is a matter of
//! pointing `api_base_url` at it.

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};

use super::image_gen::ImageGenProvider;
use super::retry::ModelCallError;
use super::text::TextProvider;
use super::vision::VisionProvider;

/// Classify an HTTP response status as transport failure vs. application
/// error: 429 and 5xx are transient (the caller's retry loop should try
/// again); everything else — including other 4xx — is fatal for this
/// call.
fn classify_status(status: reqwest::StatusCode, body: String) -> ModelCallError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ModelCallError::Transient(format!("HTTP {status}: {body}"))
    } else {
        ModelCallError::Fatal(format!("HTTP {status}: {body}"))
    }
}

fn encode_images(image_refs: &[Vec<u8>]) -> Vec<String> {
    image_refs
        .iter()
        .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
        .collect()
}

async fn post_json(
    client: &reqwest::Client,
    base_url: &str,
    path: &str,
    api_key: Option<&str>,
    body: Value,
) -> Result<Value, ModelCallError> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), path);
    let mut request = client.post(&url).json(&body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ModelCallError::Transient(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(classify_status(status, text));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| ModelCallError::Fatal(format!("malformed JSON response: {e}")))
}

/// `TextStructured` capability (§4.A #1) over a configurable HTTP endpoint.
pub struct HttpTextProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpTextProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextProvider for HttpTextProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Value, ModelCallError> {
        let body = json!({
            "model": self.model,
            "system_prompt": system_prompt,
            "user_prompt": user_prompt,
        });
        post_json(&self.client, &self.base_url, "/text/complete", self.api_key.as_deref(), body).await
    }
}

/// `Vision` capability (§4.A #2) over a configurable HTTP endpoint.
pub struct HttpVisionProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpVisionProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }
}

#[async_trait]
impl VisionProvider for HttpVisionProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn analyze(&self, prompt: &str, image_refs: &[Vec<u8>]) -> Result<Value, ModelCallError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "images_base64": encode_images(image_refs),
        });
        post_json(&self.client, &self.base_url, "/vision/analyze", self.api_key.as_deref(), body).await
    }
}

/// `ImageGen` capability (§4.A #3) over a configurable HTTP endpoint. The
/// response is expected to carry the rendered image as a base64 string
/// under `image_base64`.
pub struct HttpImageGenProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpImageGenProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ImageGenProvider for HttpImageGenProvider {
    async fn generate(&self, model: &str, prompt: &str, image_refs: &[Vec<u8>]) -> Result<Vec<u8>, ModelCallError> {
        let body = json!({
            "model": model,
            "prompt": prompt,
            "images_base64": encode_images(image_refs),
        });
        let response = post_json(&self.client, &self.base_url, "/image/generate", self.api_key.as_deref(), body).await?;

        let encoded = response
            .get("image_base64")
            .and_then(Value::as_str)
            .ok_or_else(|| ModelCallError::Fatal("response missing 'image_base64' field".to_string()))?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ModelCallError::Fatal(format!("malformed base64 image payload: {e}")))
    }
}
