//! Remote vision analysis through the OpenAI chat completions API

use crate::camera::Frame;
use crate::config::OpenAiConfig;
use crate::error::EyeError;
use crate::sources::{DetectionOutput, DetectionSource};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};
use sizeup_core::parse_remote_report;
use std::time::Duration;
use tracing::{debug, info};

/// Fixed instruction sent with every frame
pub const ANALYSIS_PROMPT: &str = "Identify the main object in this photo and estimate its size. \
Answer with a single JSON object and nothing else, in this exact form: \
{\"object\": <name>, \"confidence\": <0 to 1>, \"volume\": <liters>, \
\"dimensions\": {\"width\": <centimeters>, \"height\": <centimeters>, \"depth\": <centimeters>}}";

/// Chat completions request carrying the frame as a base64 data URI
pub fn build_request_body(model: &str, max_tokens: u32, frame: &Frame) -> Value {
    let data_uri = format!(
        "data:image/jpeg;base64,{}",
        general_purpose::STANDARD.encode(&frame.jpeg)
    );

    json!({
        "model": model,
        "max_tokens": max_tokens,
        "temperature": 0.0,
        "response_format": { "type": "json_object" },
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": ANALYSIS_PROMPT },
                { "type": "image_url", "image_url": { "url": data_uri } }
            ]
        }]
    })
}

/// Text of the first choice of a chat completions response
pub fn extract_reply_content(response: &Value) -> Result<String, EyeError> {
    let choices = response
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            EyeError::MalformedRemoteResponse("Invalid response format: no choices array".to_string())
        })?;

    let choice = choices
        .first()
        .ok_or_else(|| EyeError::MalformedRemoteResponse("No choices in response".to_string()))?;

    choice["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| EyeError::MalformedRemoteResponse("Choice has no text content".to_string()))
}

/// First eight characters of the key for logs, or `***` for short keys
fn key_prefix(api_key: &str) -> String {
    if api_key.chars().count() > 8 {
        api_key.chars().take(8).collect()
    } else {
        "***".to_string()
    }
}

pub struct OpenAiVisionSource {
    config: OpenAiConfig,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiVisionSource {
    pub fn new(config: OpenAiConfig) -> Result<Self, EyeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let api_key = config.resolve_api_key();

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn get_api_key(&self) -> Result<&str, EyeError> {
        self.api_key.as_deref().ok_or_else(|| {
            EyeError::DetectionSourceUnavailable(format!(
                "API key not set (configure openai.api_key or {})",
                OpenAiConfig::API_KEY_ENV
            ))
        })
    }
}

#[async_trait]
impl DetectionSource for OpenAiVisionSource {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn load(&self) -> Result<(), EyeError> {
        self.get_api_key()?;
        if !self.config.base_url.starts_with("https://") {
            return Err(EyeError::Config("Invalid base URL".to_string()));
        }
        info!("Remote vision model ready: {}", self.config.model);
        Ok(())
    }

    async fn detect(&self, frame: &Frame) -> Result<DetectionOutput, EyeError> {
        let api_key = self.get_api_key()?;

        if frame.jpeg.len() > self.config.max_image_bytes {
            return Err(EyeError::DetectionSourceUnavailable(format!(
                "Image is {} bytes, the API accepts at most {}",
                frame.jpeg.len(),
                self.config.max_image_bytes
            )));
        }

        let body = build_request_body(&self.config.model, self.config.max_tokens, frame);

        debug!(
            "Sending {} byte frame to OpenAI with key {}...",
            frame.jpeg.len(),
            key_prefix(api_key)
        );

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EyeError::DetectionSourceUnavailable(format!("Request failed: {}", e)))?;

        let status = response.status();

        if status == 429 {
            return Err(EyeError::RateLimit);
        }

        if status == 401 || status == 403 {
            return Err(EyeError::AuthenticationFailed);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text: String = text.chars().take(500).collect();
            return Err(EyeError::DetectionSourceUnavailable(format!("HTTP {}: {}", status, text)));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| EyeError::MalformedRemoteResponse(format!("Response is not JSON: {}", e)))?;

        let content = extract_reply_content(&json)?;
        debug!("Remote reply: {}", content);

        let report = parse_remote_report(&content)?;
        Ok(DetectionOutput::Remote(report))
    }
}
