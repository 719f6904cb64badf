// ABOUTME: OpenAI-compatible chat completion provider for food recognition inference
// ABOUTME: Sends text and optional image parts, maps HTTP failures to error codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Provider
//!
//! Works with any endpoint implementing the `OpenAI` chat completions API:
//! Ollama, vLLM, `LocalAI`, or a hosted service.
//!
//! ## Configuration
//!
//! - `FOOD_LLM_BASE_URL`: Base URL (default: <http://localhost:11434/v1> for Ollama)
//! - `FOOD_LLM_MODEL`: Model to use (default: `qwen2.5vl:7b`)
//! - `FOOD_LLM_API_KEY`: API key (optional, empty for local servers)
//! - `FOOD_LLM_VISION`: Whether the model accepts images (default: `true`)
//!
//! Images are sent as `image_url` content parts. A request carrying an image
//! is rejected before sending when the provider lacks `VISION`.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider, TokenUsage};
use crate::errors::{AppError, ErrorCode};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Environment variable for the inference base URL
const FOOD_LLM_BASE_URL_ENV: &str = "FOOD_LLM_BASE_URL";

/// Environment variable for the inference model
const FOOD_LLM_MODEL_ENV: &str = "FOOD_LLM_MODEL";

/// Environment variable for the API key (optional)
const FOOD_LLM_API_KEY_ENV: &str = "FOOD_LLM_API_KEY";

/// Environment variable toggling image input
const FOOD_LLM_VISION_ENV: &str = "FOOD_LLM_VISION";

/// Default base URL (Ollama)
const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// Default vision model for local inference
const DEFAULT_MODEL: &str = "qwen2.5vl:7b";

/// Connection timeout
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Request timeout (vision inference on local hardware can be slow)
const REQUEST_TIMEOUT_SECS: u64 = 300;

const SERVICE_NAME: &str = "Inference backend";

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

/// Message for the API; `content` is a string, or a parts array when an image is attached
#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: Value,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        let content = msg.image_data_url.as_ref().map_or_else(
            || Value::String(msg.content.clone()),
            |url| {
                json!([
                    { "type": "text", "text": msg.content },
                    { "type": "image_url", "image_url": { "url": url } }
                ])
            },
        );
        Self {
            role: msg.role.as_str().to_owned(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <http://localhost:11434/v1>)
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Default model to use
    pub default_model: String,
    /// Provider name for logging
    pub provider_name: String,
    /// Capabilities of this provider
    pub capabilities: LlmCapabilities,
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            default_model: DEFAULT_MODEL.to_owned(),
            provider_name: "ollama".to_owned(),
            capabilities: LlmCapabilities::full_featured(),
        }
    }
}

impl OpenAiCompatibleConfig {
    /// Load configuration from `FOOD_LLM_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when `FOOD_LLM_VISION` is not a boolean or the
    /// base URL is not an http(s) URL.
    pub fn from_env() -> Result<Self, AppError> {
        let base_url =
            env::var(FOOD_LLM_BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let default_model =
            env::var(FOOD_LLM_MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
        let api_key = env::var(FOOD_LLM_API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty());
        let vision = match env::var(FOOD_LLM_VISION_ENV) {
            Ok(raw) => parse_bool(&raw).ok_or_else(|| {
                AppError::config_invalid(FOOD_LLM_VISION_ENV, format!("'{raw}' is not a boolean"))
            })?,
            Err(_) => true,
        };

        let mut capabilities = LlmCapabilities::JSON_MODE;
        capabilities.set(LlmCapabilities::VISION, vision);

        let config = Self {
            provider_name: detect_provider_name(&base_url).to_owned(),
            base_url,
            api_key,
            default_model,
            capabilities,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the base URL and model
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the offending setting.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AppError::config_invalid(
                FOOD_LLM_BASE_URL_ENV,
                format!("'{}' is not an http(s) URL", self.base_url),
            ));
        }
        if self.default_model.trim().is_empty() {
            return Err(AppError::config_invalid(
                FOOD_LLM_MODEL_ENV,
                "model name must not be empty",
            ));
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn detect_provider_name(base_url: &str) -> &'static str {
    if base_url.contains(":11434") {
        "ollama"
    } else if base_url.contains(":8000") {
        "vllm"
    } else if base_url.contains("api.openai.com") {
        "openai"
    } else {
        "local"
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible LLM provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        config.validate()?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create a provider from `FOOD_LLM_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the environment holds invalid values or the HTTP
    /// client cannot be created.
    pub fn from_env() -> Result<Self, AppError> {
        let config = OpenAiCompatibleConfig::from_env()?;
        info!(
            "Initializing {} inference provider: base_url={}, model={}, vision={}",
            config.provider_name,
            config.base_url,
            config.default_model,
            config.capabilities.supports_vision()
        );
        Self::new(config)
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn add_auth_header(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request.header("Authorization", format!("Bearer {api_key}"))
        } else {
            request
        }
    }

    fn build_request(&self, request: &ChatRequest) -> Result<OpenAiRequest, AppError> {
        if request.has_images() && !self.config.capabilities.supports_vision() {
            return Err(AppError::invalid_input(format!(
                "Model '{}' does not accept image input",
                self.config.default_model
            )));
        }

        let response_format = (request.json_mode
            && self.config.capabilities.supports_json_mode())
        .then(|| json!({ "type": "json_object" }));

        Ok(OpenAiRequest {
            model: self.config.default_model.clone(),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
            response_format,
        })
    }

    /// Map a non-success HTTP response to an error
    fn parse_error_response(status: StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |response| {
                let error_type = response
                    .error
                    .error_type
                    .unwrap_or_else(|| "unknown".to_owned());
                format!("{error_type} - {}", response.error.message)
            },
        );

        match status.as_u16() {
            401 => AppError::auth_invalid(format!("API authentication failed: {detail}")),
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                extract_rate_limit_message(&detail),
            ),
            _ => AppError::external_service(SERVICE_NAME, format!("API error ({status}): {detail}")),
        }
    }
}

/// User-facing rate limit message, keeping a "try again in N" hint when present
fn extract_rate_limit_message(message: &str) -> String {
    let lowered = message.to_lowercase();
    if let Some(retry_pos) = lowered.find("try again in ") {
        let after_prefix = &lowered[retry_pos + "try again in ".len()..];
        let end_pos = after_prefix
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(after_prefix.len());
        if let Ok(seconds) = after_prefix[..end_pos].parse::<f64>() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let seconds_int = seconds.ceil() as u64;
            return format!("Inference rate limit reached. Please try again in {seconds_int} seconds.");
        }
    }
    "Inference rate limit reached. Please wait a moment and try again.".to_owned()
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        detect_provider_name(&self.config.base_url)
    }

    fn display_name(&self) -> &'static str {
        match self.name() {
            "ollama" => "Ollama (Local)",
            "vllm" => "vLLM (Local)",
            "openai" => "OpenAI",
            _ => "OpenAI-compatible endpoint",
        }
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(provider = %self.config.provider_name, model = %self.config.default_model))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let openai_request = self.build_request(request)?;
        debug!(
            messages = openai_request.messages.len(),
            json_mode = openai_request.response_format.is_some(),
            has_image = request.has_images(),
            "Sending chat completion request"
        );

        let http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Content-Type", "application/json")
            .json(&openai_request);

        let response = self.add_auth_header(http_request).send().await.map_err(|e| {
            error!("Failed to send request to {}: {}", self.config.provider_name, e);
            if e.is_connect() || e.is_timeout() {
                AppError::new(
                    ErrorCode::ExternalServiceUnavailable,
                    format!(
                        "Cannot reach {} at {}: {e}",
                        self.config.provider_name, self.config.base_url
                    ),
                )
            } else {
                AppError::external_service(SERVICE_NAME, format!("Failed to connect: {e}"))
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read API response: {}", e);
            AppError::external_service(SERVICE_NAME, format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(
                "Failed to parse API response: {} - body: {}",
                e,
                body.chars().take(500).collect::<String>()
            );
            AppError::external_service(SERVICE_NAME, format!("Failed to parse response: {e}"))
        })?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service(SERVICE_NAME, "API returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();
        debug!(
            content_len = content.len(),
            finish_reason = ?choice.finish_reason,
            "Received chat completion"
        );

        Ok(ChatResponse {
            content,
            model: openai_response
                .model
                .unwrap_or_else(|| openai_request.model.clone()),
            usage: openai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt,
                completion_tokens: u.completion,
                total_tokens: u.total,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}
