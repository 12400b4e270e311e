//! Vision-model client (OpenAI-compatible chat completions).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::VisionConfig;
use crate::error::RecognitionError;

/// Chat-completions client that can attach an image to a prompt.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl VisionClient {
    pub fn new(config: &VisionConfig, api_key: impl Into<String>) -> Result<Self, RecognitionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecognitionError::SourceUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model about one image; returns its raw text answer.
    pub async fn describe_image(
        &self,
        prompt: &str,
        image: &[u8],
        mime: &str,
    ) -> Result<String, RecognitionError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::user_with_image(prompt, image, mime)],
            max_tokens: Some(self.max_tokens),
        };

        debug!(
            "Sending vision request: model={} image={} bytes",
            request.model,
            image.len()
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecognitionError::SourceUnavailable("request timed out".to_string())
                } else {
                    RecognitionError::SourceUnavailable(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let snippet: String = error_text.chars().take(500).collect();
            return Err(RecognitionError::SourceUnavailable(format!(
                "API error ({}): {}",
                status, snippet
            )));
        }

        let response: ChatCompletionResponse = response.json().await.map_err(|e| {
            RecognitionError::SourceUnavailable(format!("unreadable response: {}", e))
        })?;

        if let Some(usage) = &response.usage {
            info!(
                "Vision response: {} tokens (prompt: {}, completion: {})",
                usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| RecognitionError::SourceUnavailable("empty response".to_string()))
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
struct ImageUrl {
    url: String,
}

impl Message {
    /// User message with a prompt and one inline (base64 data URL) image.
    fn user_with_image(text: &str, image: &[u8], mime: &str) -> Self {
        let data_url = format!("data:{};base64,{}", mime, BASE64.encode(image));
        Self {
            role: "user",
            content: vec![
                ContentPart::Text {
                    text: text.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ],
        }
    }
}
