// ABOUTME: Environment-based configuration for the recognition pipeline
// ABOUTME: Loads gate, reference lookup, keyword, and inference settings with fail-fast validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment configuration
//!
//! | Variable | Default |
//! |----------|---------|
//! | `FOOD_GATE_MAX_CONCURRENT` | 4 |
//! | `FOOD_REFERENCE_BASE_URL` | `https://world.openfoodfacts.org` |
//! | `FOOD_REFERENCE_SEARCH_PATH` | `/cgi/search.pl` |
//! | `FOOD_REFERENCE_PAGE_SIZE` | 10 |
//! | `FOOD_REFERENCE_TIMEOUT_SECS` | 5 |
//! | `FOOD_REFERENCE_CACHE_TTL_SECS` | 86400 |
//! | `FOOD_REFERENCE_CACHE_ITEMS` | 512 |
//! | `FOOD_REFERENCE_USER_AGENT` | `nutrilens/<version>` |
//! | `FOOD_BRAND_KEYWORDS_EXTRA` | (none) |
//! | `FOOD_GENERIC_DISHES_EXTRA` | (none) |
//! | `FOOD_FILLER_WORDS_EXTRA` | (none) |
//!
//! Inference backend variables (`FOOD_LLM_*`) are read by
//! [`OpenAiCompatibleConfig::from_env`](crate::llm::OpenAiCompatibleConfig::from_env).

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::keywords::KeywordConfig;
use crate::constants::DEFAULT_MAX_CONCURRENT_INFERENCE;
use crate::errors::{AppError, AppResult};
use crate::external::ReferenceLookupConfig;

/// Concurrency gate settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Maximum simultaneous inference calls
    pub max_concurrent: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT_INFERENCE,
        }
    }
}

impl GateConfig {
    /// Reject a zero limit
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when `max_concurrent` is zero.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent == 0 {
            return Err(AppError::config_invalid(
                "FOOD_GATE_MAX_CONCURRENT",
                "concurrency limit must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Recognition pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Concurrency gate
    pub gate: GateConfig,
    /// Reference database client
    pub reference: ReferenceLookupConfig,
    /// Brand, generic-dish and filler-word dictionaries
    pub keywords: KeywordConfig,
}

impl RecognitionConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables take their defaults; set but unparsable values are
    /// errors, never silently defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the first variable that fails to parse
    /// or validate.
    pub fn from_env() -> AppResult<Self> {
        info!("Loading recognition configuration from environment variables");
        let defaults = ReferenceLookupConfig::default();

        let config = Self {
            gate: GateConfig {
                max_concurrent: parse_env_or(
                    "FOOD_GATE_MAX_CONCURRENT",
                    DEFAULT_MAX_CONCURRENT_INFERENCE,
                )?,
            },
            reference: ReferenceLookupConfig {
                base_url: env_var_or("FOOD_REFERENCE_BASE_URL", &defaults.base_url),
                search_path: env_var_or("FOOD_REFERENCE_SEARCH_PATH", &defaults.search_path),
                page_size: parse_env_or("FOOD_REFERENCE_PAGE_SIZE", defaults.page_size)?,
                rung_timeout_secs: parse_env_or(
                    "FOOD_REFERENCE_TIMEOUT_SECS",
                    defaults.rung_timeout_secs,
                )?,
                cache_ttl_secs: parse_env_or(
                    "FOOD_REFERENCE_CACHE_TTL_SECS",
                    defaults.cache_ttl_secs,
                )?,
                max_cache_items: parse_env_or(
                    "FOOD_REFERENCE_CACHE_ITEMS",
                    defaults.max_cache_items,
                )?,
                user_agent: env_var_or("FOOD_REFERENCE_USER_AGENT", &defaults.user_agent),
            },
            keywords: KeywordConfig::default()
                .with_extra_brands(&parse_list(&env_var_or("FOOD_BRAND_KEYWORDS_EXTRA", "")))
                .with_extra_generic_dishes(&parse_list(&env_var_or(
                    "FOOD_GENERIC_DISHES_EXTRA",
                    "",
                )))
                .with_extra_filler_words(&parse_list(&env_var_or("FOOD_FILLER_WORDS_EXTRA", ""))),
        };

        config.validate()?;
        info!(
            max_concurrent = config.gate.max_concurrent,
            reference_url = %config.reference.base_url,
            brands = config.keywords.brands.len(),
            "Recognition configuration loaded"
        );
        Ok(config)
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first section's `ConfigInvalid` error.
    pub fn validate(&self) -> AppResult<()> {
        self.gate.validate()?;
        self.reference.validate()
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` only when unset
fn parse_env_or<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config_invalid(key, format!("'{raw}' is not valid: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse a comma-separated list
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}
