// ABOUTME: Food recognition pipeline service wiring gate, inference, interpretation, lookup, and reconciliation
// ABOUTME: Entry points for interpreting replies, reconciling estimates, gating calls, and full recognition
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Food Recognition Service
//!
//! Control flow for one request, strictly in this order:
//!
//! ```text
//! caller -> gate -> inference call -> interpreter -> reference lookup -> reconciliation
//! ```
//!
//! Only the inference call is gated. The lookup runs outside the gate, and an
//! unavailable reference database downgrades the result to the model-only
//! estimate instead of failing the request.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::field::Empty;
use tracing::{info, instrument, warn, Span};
use uuid::Uuid;

use crate::concurrency::ConcurrencyGate;
use crate::config::{KeywordConfig, RecognitionConfig};
use crate::errors::{AppError, AppResult};
use crate::external::{FoodReferenceClient, ReferenceLookup};
use crate::intelligence::{self, Interpretation, ParseStrategy, ReconcileDecision, Reconciled};
use crate::llm::prompts::food_recognition_prompt;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::logging::RecognitionLogger;
use crate::models::NutritionEstimate;

/// User text sent when only a photo was supplied
const IMAGE_ONLY_PROMPT: &str = "Определи блюдо на фото и оцени его пищевую ценность.";

/// Sampling temperature for recognition calls
const RECOGNITION_TEMPERATURE: f32 = 0.2;

/// Reply budget; the JSON object needs far less
const RECOGNITION_MAX_TOKENS: u32 = 1024;

/// One recognition request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognitionInput {
    /// Free-text meal description
    pub text: Option<String>,
    /// Meal photo as a `data:` URL
    pub image_data_url: Option<String>,
}

impl RecognitionInput {
    /// Text-only request
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image_data_url: None,
        }
    }

    /// Attach a photo
    #[must_use]
    pub fn with_image(mut self, image_data_url: impl Into<String>) -> Self {
        self.image_data_url = Some(image_data_url.into());
        self
    }

    fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    fn validate(&self) -> AppResult<()> {
        if self.trimmed_text().is_none() && self.image_data_url.is_none() {
            return Err(AppError::invalid_input(
                "Recognition needs a text description, a photo, or both",
            ));
        }
        Ok(())
    }

    fn to_chat_request(&self) -> ChatRequest {
        let text = self.trimmed_text().unwrap_or(IMAGE_ONLY_PROMPT);
        let user = match &self.image_data_url {
            Some(url) => ChatMessage::user_with_image(text, url.clone()),
            None => ChatMessage::user(text),
        };

        ChatRequest::new(vec![ChatMessage::system(food_recognition_prompt()), user])
            .with_temperature(RECOGNITION_TEMPERATURE)
            .with_max_tokens(RECOGNITION_MAX_TOKENS)
            .with_json_mode()
    }
}

/// Result of one recognition request
///
/// `estimate` is `None` when the reply held no nutrition figures; callers then
/// show `raw_text` without structured fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionOutcome {
    /// Correlation ID for logs
    pub request_id: String,
    /// Unmodified model reply
    pub raw_text: String,
    /// Final nutrition record
    pub estimate: Option<NutritionEstimate>,
    /// Interpretation strategy that succeeded
    pub strategy: Option<ParseStrategy>,
    /// Arbitration outcome
    pub decision: Option<ReconcileDecision>,
}

/// Recognition pipeline
#[derive(Clone)]
pub struct FoodRecognitionService {
    gate: ConcurrencyGate,
    provider: Arc<dyn LlmProvider>,
    lookup: Arc<dyn ReferenceLookup>,
    keywords: Arc<KeywordConfig>,
}

impl FoodRecognitionService {
    /// Assemble a service from explicit parts
    #[must_use]
    pub fn new(
        gate: ConcurrencyGate,
        provider: Arc<dyn LlmProvider>,
        lookup: Arc<dyn ReferenceLookup>,
        keywords: KeywordConfig,
    ) -> Self {
        Self {
            gate,
            provider,
            lookup,
            keywords: Arc::new(keywords),
        }
    }

    /// Build the gate and reference client from configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when the gate or reference settings are invalid.
    pub fn from_config(
        config: &RecognitionConfig,
        provider: Arc<dyn LlmProvider>,
    ) -> AppResult<Self> {
        config.validate()?;
        let gate = ConcurrencyGate::new(config.gate.max_concurrent)?;
        let lookup = FoodReferenceClient::new(config.reference.clone(), config.keywords.clone())?;
        Ok(Self::new(
            gate,
            provider,
            Arc::new(lookup),
            config.keywords.clone(),
        ))
    }

    /// The gate guarding inference calls
    #[must_use]
    pub const fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Interpret a raw model reply
    #[must_use]
    pub fn interpret(&self, raw_model_text: &str) -> Option<Interpretation> {
        intelligence::interpret(raw_model_text)
    }

    /// Look `food_name` up and arbitrate against the model estimate
    #[instrument(skip(self, model_estimate))]
    pub async fn reconcile(&self, model_estimate: NutritionEstimate, food_name: &str) -> Reconciled {
        let candidate = self.lookup.lookup(food_name).await;
        intelligence::reconcile(model_estimate, candidate.as_ref(), &self.keywords)
    }

    /// Run `work` while holding a gate slot
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`.
    pub async fn with_gate<F, Fut, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<AppError>,
    {
        self.gate.with_gate(work).await
    }

    /// Full pipeline for one request
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty request, and the inference
    /// provider's error when the upstream call fails. A reply without
    /// nutrition figures or a failed lookup is not an error.
    #[instrument(skip(self, input), fields(request_id = Empty))]
    pub async fn recognize(&self, input: RecognitionInput) -> AppResult<RecognitionOutcome> {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());
        let started = Instant::now();

        input.validate()?;
        let request = input.to_chat_request();

        let response = self
            .with_gate(|| self.provider.complete(&request))
            .await
            .map_err(|e| {
                warn!(error = %e, provider = self.provider.name(), "Inference call failed");
                e.with_request_id(request_id.clone())
            })?;

        let Some(interpretation) = self.interpret(&response.content) else {
            info!("Model reply carried no nutrition figures");
            RecognitionLogger::log_outcome(&request_id, None, None, elapsed_ms(started));
            return Ok(RecognitionOutcome {
                request_id,
                raw_text: response.content,
                estimate: None,
                strategy: None,
                decision: None,
            });
        };

        let food_name = interpretation.estimate.food_name.clone();
        let lookup_started = Instant::now();
        let reconciled = self.reconcile(interpretation.estimate, &food_name).await;
        RecognitionLogger::log_lookup(
            &request_id,
            &food_name,
            reconciled.decision != ReconcileDecision::NoCandidate,
            elapsed_ms(lookup_started),
        );

        RecognitionLogger::log_outcome(
            &request_id,
            Some(interpretation.strategy),
            Some(reconciled.decision),
            elapsed_ms(started),
        );

        Ok(RecognitionOutcome {
            request_id,
            raw_text: response.content,
            estimate: Some(reconciled.estimate),
            strategy: Some(interpretation.strategy),
            decision: Some(reconciled.decision),
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_rejected() {
        assert!(RecognitionInput::default().validate().is_err());
        assert!(RecognitionInput::from_text("   ").validate().is_err());
        assert!(RecognitionInput::default()
            .with_image("data:image/png;base64,AAAA")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_image_only_request_gets_default_text() {
        let request = RecognitionInput::default()
            .with_image("data:image/png;base64,AAAA")
            .to_chat_request();

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].content, IMAGE_ONLY_PROMPT);
        assert!(request.has_images());
        assert!(request.json_mode);
        assert_eq!(request.max_tokens, Some(RECOGNITION_MAX_TOKENS));
    }
}
