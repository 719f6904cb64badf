// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging setup, sample records, and stub lookup/provider implementations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `nutrilens`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use nutrilens::errors::{AppError, ErrorCode};
use nutrilens::external::{ReferenceLookup, ReferenceLookupConfig};
use nutrilens::llm::{ChatRequest, ChatResponse, LlmCapabilities, LlmProvider};
use nutrilens::models::{NutritionEstimate, PortionUnit, ReferenceCandidate};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN, // Default to WARN for quiet tests
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Reference client configuration pointing at a mock server
pub fn reference_config(base_url: &str) -> ReferenceLookupConfig {
    ReferenceLookupConfig {
        base_url: base_url.to_owned(),
        rung_timeout_secs: 2,
        ..ReferenceLookupConfig::default()
    }
}

/// Model estimate with every field set
pub fn model_estimate(
    name: &str,
    calories: f64,
    protein: f64,
    fat: f64,
    carbs: f64,
) -> NutritionEstimate {
    let mut estimate = NutritionEstimate::new(name, 100.0, PortionUnit::Mass);
    estimate.calories = Some(calories);
    estimate.protein = Some(protein);
    estimate.fat = Some(fat);
    estimate.carbs = Some(carbs);
    estimate
}

/// Complete reference candidate
pub fn candidate(
    name: &str,
    portion: f64,
    calories: f64,
    protein: f64,
    fat: f64,
    carbs: f64,
) -> ReferenceCandidate {
    ReferenceCandidate {
        food_name: name.to_owned(),
        brand: None,
        portion_size: portion,
        unit: PortionUnit::Mass,
        calories: Some(calories),
        protein: Some(protein),
        fat: Some(fat),
        carbs: Some(carbs),
        ingredients: None,
    }
}

/// Lookup that always answers with the same candidate and records queried names
#[derive(Default)]
pub struct StubLookup {
    pub answer: Option<ReferenceCandidate>,
    pub queried: Mutex<Vec<String>>,
}

impl StubLookup {
    pub fn answering(answer: Option<ReferenceCandidate>) -> Self {
        Self {
            answer,
            queried: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ReferenceLookup for StubLookup {
    async fn lookup(&self, food_name: &str) -> Option<ReferenceCandidate> {
        self.queried.lock().await.push(food_name.to_owned());
        self.answer.clone()
    }
}

/// Provider returning a fixed reply after a delay, tracking peak concurrency
pub struct ScriptedProvider {
    reply: Result<String, ErrorCode>,
    delay: Duration,
    active: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn replying(reply: &str) -> Self {
        Self::new(Ok(reply.to_owned()), Duration::ZERO)
    }

    pub fn failing(code: ErrorCode) -> Self {
        Self::new(Err(code), Duration::ZERO)
    }

    pub fn new(reply: Result<String, ErrorCode>, delay: Duration) -> Self {
        Self {
            reply,
            delay,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted test provider"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::full_featured()
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        match &self.reply {
            Ok(content) => Ok(ChatResponse {
                content: content.clone(),
                model: "scripted-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            Err(code) => Err(AppError::new(*code, "scripted failure")),
        }
    }
}
