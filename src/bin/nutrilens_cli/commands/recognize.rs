// ABOUTME: Recognize command for nutrilens-cli
// ABOUTME: Runs the full gate, inference, interpretation, lookup, and reconciliation pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use nutrilens::config::RecognitionConfig;
use nutrilens::llm::{encode_image_data_url, OpenAiCompatibleProvider};
use nutrilens::services::{FoodRecognitionService, RecognitionInput};
use tokio::fs;

use crate::helpers::display::{print_json, print_no_structured_data};

/// Recognize one meal
pub async fn run(text: Option<String>, image: Option<&Path>) -> Result<()> {
    if text.is_none() && image.is_none() {
        bail!("Provide --text, --image, or both");
    }

    let mut input = RecognitionInput {
        text,
        image_data_url: None,
    };
    if let Some(path) = image {
        let bytes = fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        input = input.with_image(encode_image_data_url(mime_for(path), &bytes));
    }

    let config = RecognitionConfig::from_env()?;
    let provider = OpenAiCompatibleProvider::from_env()?;
    let service = FoodRecognitionService::from_config(&config, Arc::new(provider))?;

    let outcome = service.recognize(input).await?;
    match &outcome.estimate {
        Some(estimate) => {
            print_json(estimate)?;
            if let Some(decision) = outcome.decision {
                let source = if decision.used_reference() {
                    "reference"
                } else {
                    "model"
                };
                println!("source: {source}");
            }
        }
        None => print_no_structured_data(&outcome.raw_text),
    }
    Ok(())
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}
