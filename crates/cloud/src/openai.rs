//! Client for the OpenAI chat-completion and image-generation endpoints.

use std::time::Duration;

use idioms_core::generation::{ChatMessage, ChatPrompt};
use serde::{Deserialize, Serialize};

/// Connection and model settings for the generation API.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub organization: Option<String>,
    /// Base URL without a trailing slash, e.g. `https://api.openai.com`.
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            organization: None,
            base_url: "https://api.openai.com".to_string(),
            text_model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Errors from the generation API layer.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("OpenAI API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// A 2xx response without any usable choice or image.
    #[error("OpenAI response contained no {0}")]
    EmptyResponse(&'static str),
}

impl OpenAiError {
    /// Whether the same request may succeed later.
    ///
    /// Network failures, 5xx, 408 and 429 are retryable. Other 4xx answers
    /// and empty responses repeat for the same prompt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::ApiError { status, .. } => matches!(*status, 408 | 429) || *status >= 500,
            Self::EmptyResponse(_) => false,
        }
    }
}

/// Produces text for a chat prompt.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Return the content of the first completion choice.
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, OpenAiError>;
}

/// Produces an image for a text prompt.
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Return a URL from which the generated image can be downloaded.
    async fn generate_image(&self, prompt: &str) -> Result<String, OpenAiError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'static str,
    quality: &'static str,
    style: &'static str,
    response_format: &'static str,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for an OpenAI-compatible API.
pub struct OpenAiClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, OpenAiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(format!("{}{path}", self.config.base_url))
            .bearer_auth(&self.config.api_key);
        match &self.config.organization {
            Some(org) => builder.header("OpenAI-Organization", org),
            None => builder,
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, otherwise capture the
    /// status and body in an [`OpenAiError::ApiError`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, OpenAiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OpenAiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, OpenAiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, OpenAiError> {
        let body = ChatCompletionRequest {
            model: &self.config.text_model,
            messages: &prompt.messages,
            temperature: prompt.temperature,
            response_format: prompt
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self.post("/v1/chat/completions").json(&body).send().await?;
        let parsed: ChatCompletionResponse = Self::parse_response(response).await?;

        tracing::debug!(
            model = %self.config.text_model,
            choices = parsed.choices.len(),
            "Chat completion received"
        );

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(OpenAiError::EmptyResponse("completion choice"))
    }
}

#[async_trait::async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate_image(&self, prompt: &str) -> Result<String, OpenAiError> {
        let body = ImageRequest {
            model: &self.config.image_model,
            prompt,
            n: 1,
            size: "1024x1024",
            quality: "hd",
            style: "vivid",
            response_format: "url",
        };

        let response = self.post("/v1/images/generations").json(&body).send().await?;
        let parsed: ImageResponse = Self::parse_response(response).await?;

        parsed
            .data
            .into_iter()
            .find_map(|image| image.url)
            .ok_or(OpenAiError::EmptyResponse("image url"))
    }
}
