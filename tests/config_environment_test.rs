// ABOUTME: Unit tests for environment-driven recognition and inference configuration
// ABOUTME: Validates defaults, overrides, keyword extensions, and fail-fast errors on bad values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::env;

use nutrilens::config::RecognitionConfig;
use nutrilens::errors::ErrorCode;
use nutrilens::llm::{LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use serial_test::serial;

const FOOD_VARS: &[&str] = &[
    "FOOD_GATE_MAX_CONCURRENT",
    "FOOD_REFERENCE_BASE_URL",
    "FOOD_REFERENCE_SEARCH_PATH",
    "FOOD_REFERENCE_PAGE_SIZE",
    "FOOD_REFERENCE_TIMEOUT_SECS",
    "FOOD_REFERENCE_CACHE_TTL_SECS",
    "FOOD_REFERENCE_CACHE_ITEMS",
    "FOOD_REFERENCE_USER_AGENT",
    "FOOD_BRAND_KEYWORDS_EXTRA",
    "FOOD_GENERIC_DISHES_EXTRA",
    "FOOD_FILLER_WORDS_EXTRA",
    "FOOD_LLM_BASE_URL",
    "FOOD_LLM_MODEL",
    "FOOD_LLM_API_KEY",
    "FOOD_LLM_VISION",
];

fn clear_food_env() {
    for var in FOOD_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_when_unset() {
    common::init_test_logging();
    clear_food_env();

    let config = RecognitionConfig::from_env().unwrap();
    assert_eq!(config, RecognitionConfig::default());
    assert_eq!(config.gate.max_concurrent, 4);
    assert_eq!(config.reference.base_url, "https://world.openfoodfacts.org");
    assert_eq!(config.reference.page_size, 10);
}

#[test]
#[serial]
fn test_overrides_and_keyword_extensions() {
    clear_food_env();
    env::set_var("FOOD_GATE_MAX_CONCURRENT", "2");
    env::set_var("FOOD_REFERENCE_BASE_URL", "http://localhost:9000");
    env::set_var("FOOD_REFERENCE_PAGE_SIZE", " 25 ");
    env::set_var("FOOD_BRAND_KEYWORDS_EXTRA", "Чудо, Растишка");
    env::set_var("FOOD_FILLER_WORDS_EXTRA", "домашний");

    let config = RecognitionConfig::from_env().unwrap();
    clear_food_env();

    assert_eq!(config.gate.max_concurrent, 2);
    assert_eq!(config.reference.base_url, "http://localhost:9000");
    assert_eq!(config.reference.page_size, 25);
    assert!(config.keywords.matches_brand("Коктейль Чудо"));
    assert_eq!(
        config.keywords.brands.iter().filter(|b| *b == "растишка").count(),
        1
    );
    assert!(config.keywords.is_filler("Домашний"));
}

#[test]
#[serial]
fn test_unparsable_value_names_the_variable() {
    clear_food_env();
    env::set_var("FOOD_GATE_MAX_CONCURRENT", "four");

    let err = RecognitionConfig::from_env().unwrap_err();
    clear_food_env();

    assert_eq!(err.code, ErrorCode::ConfigInvalid);
    assert!(err.message.contains("FOOD_GATE_MAX_CONCURRENT"));
}

#[test]
#[serial]
fn test_zero_concurrency_fails_fast() {
    clear_food_env();
    env::set_var("FOOD_GATE_MAX_CONCURRENT", "0");

    let err = RecognitionConfig::from_env().unwrap_err();
    clear_food_env();

    assert_eq!(err.code, ErrorCode::ConfigInvalid);
}

#[test]
#[serial]
fn test_out_of_range_page_size_rejected() {
    clear_food_env();
    env::set_var("FOOD_REFERENCE_PAGE_SIZE", "500");

    let err = RecognitionConfig::from_env().unwrap_err();
    clear_food_env();

    assert_eq!(err.code, ErrorCode::ConfigInvalid);
    assert!(err.message.contains("FOOD_REFERENCE_PAGE_SIZE"));
}

#[test]
#[serial]
fn test_llm_config_from_env() {
    clear_food_env();
    env::set_var("FOOD_LLM_BASE_URL", "http://localhost:8000/v1");
    env::set_var("FOOD_LLM_MODEL", "llava");
    env::set_var("FOOD_LLM_VISION", "no");

    let config = OpenAiCompatibleConfig::from_env().unwrap();
    let provider = OpenAiCompatibleProvider::from_env().unwrap();
    clear_food_env();

    assert_eq!(config.default_model, "llava");
    assert_eq!(config.provider_name, "vllm");
    assert!(config.api_key.is_none());
    assert!(!config.capabilities.supports_vision());
    assert!(config.capabilities.supports_json_mode());
    assert_eq!(provider.name(), "vllm");
    assert_eq!(provider.default_model(), "llava");
}

#[test]
#[serial]
fn test_llm_config_rejects_bad_values() {
    clear_food_env();
    env::set_var("FOOD_LLM_VISION", "maybe");
    let vision_err = OpenAiCompatibleConfig::from_env().unwrap_err();

    env::remove_var("FOOD_LLM_VISION");
    env::set_var("FOOD_LLM_BASE_URL", "localhost:11434");
    let url_err = OpenAiCompatibleConfig::from_env().unwrap_err();
    clear_food_env();

    assert_eq!(vision_err.code, ErrorCode::ConfigInvalid);
    assert_eq!(url_err.code, ErrorCode::ConfigInvalid);
}
