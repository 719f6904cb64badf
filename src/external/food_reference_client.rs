// ABOUTME: Reference nutrition database client with a query-relaxation ladder
// ABOUTME: Scores search results, normalizes per-100 nutriments, and rescales to the serving size
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Food Reference Client
//!
//! Looks a free-text food name up in an Open Food Facts style search API
//! (`GET {base}/cgi/search.pl?search_terms=...&json=1`). Each product carries
//! nested per-100 `nutriments`; the winning product is converted into a
//! [`ReferenceCandidate`] expressed at its own serving size.
//!
//! # Features
//! - Query ladder: cleaned name, then its first three, two and one tokens
//! - Per-rung timeout; timeouts, HTTP errors and empty results move to the next rung
//! - Completeness scoring with a name-match bonus
//! - LRU cache with TTL for successful searches
//!
//! Lookups never fail: every degraded condition resolves to `None`.

use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::config::keywords::KeywordConfig;
use crate::constants::{DEFAULT_PORTION_SIZE, KJ_PER_KCAL, REFERENCE_BASIS};
use crate::errors::{AppError, AppResult};
use crate::models::{round_one_decimal, PortionUnit, ReferenceCandidate};

const SERVICE_NAME: &str = "Food reference database";

/// Maximum tokens kept by the most specific truncated rung
const MAX_LADDER_TOKENS: usize = 3;

/// Bonus added when the product name and the query contain one another
pub const NAME_MATCH_BONUS: usize = 2;

/// Reference lookup client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLookupConfig {
    /// Base URL of the reference service (default: <https://world.openfoodfacts.org>)
    pub base_url: String,
    /// Search endpoint path appended to `base_url`
    pub search_path: String,
    /// Products requested per search (1-100)
    pub page_size: u32,
    /// Timeout for one ladder rung, in seconds
    pub rung_timeout_secs: u64,
    /// Cache TTL in seconds (default: 86400 = 24 hours)
    pub cache_ttl_secs: u64,
    /// Maximum cached search responses
    pub max_cache_items: usize,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for ReferenceLookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://world.openfoodfacts.org".to_owned(),
            search_path: "/cgi/search.pl".to_owned(),
            page_size: 10,
            rung_timeout_secs: 5,
            cache_ttl_secs: 86400, // 24 hours
            max_cache_items: 512,
            user_agent: format!("nutrilens/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ReferenceLookupConfig {
    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the first offending setting.
    pub fn validate(&self) -> AppResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AppError::config_invalid(
                "FOOD_REFERENCE_BASE_URL",
                format!("'{}' is not an http(s) URL", self.base_url),
            ));
        }
        if self.page_size == 0 || self.page_size > 100 {
            return Err(AppError::config_invalid(
                "FOOD_REFERENCE_PAGE_SIZE",
                "page size must be between 1 and 100",
            ));
        }
        if self.rung_timeout_secs == 0 {
            return Err(AppError::config_invalid(
                "FOOD_REFERENCE_TIMEOUT_SECS",
                "rung timeout must be at least 1 second",
            ));
        }
        if self.max_cache_items == 0 {
            return Err(AppError::config_invalid(
                "FOOD_REFERENCE_CACHE_ITEMS",
                "cache must hold at least one entry",
            ));
        }
        Ok(())
    }
}

/// Source of reference candidates for reconciliation
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Best-matching candidate for `food_name`, or `None` when nothing usable was found
    async fn lookup(&self, food_name: &str) -> Option<ReferenceCandidate>;
}

/// Product entry from the search response
///
/// Every field is optional; numbers may arrive as JSON numbers or strings.
#[derive(Debug, Clone, Default, Deserialize)]
struct ProductRecord {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    generic_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    serving_size: Option<Value>,
    #[serde(default)]
    ingredients_text: Option<String>,
    #[serde(default)]
    nutriments: Option<Nutriments>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Nutriments {
    #[serde(rename = "energy-kcal_100g", default)]
    energy_kcal_100g: Option<Value>,
    #[serde(rename = "energy-kj_100g", default)]
    energy_kj_100g: Option<Value>,
    #[serde(rename = "energy_100g", default)]
    energy_100g: Option<Value>,
    #[serde(rename = "proteins_100g", default)]
    proteins_100g: Option<Value>,
    #[serde(rename = "fat_100g", default)]
    fat_100g: Option<Value>,
    #[serde(rename = "carbohydrates_100g", default)]
    carbohydrates_100g: Option<Value>,
}

/// Per-100 nutrition figures of one product
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PerHundred {
    calories: Option<f64>,
    protein: Option<f64>,
    fat: Option<f64>,
    carbs: Option<f64>,
}

impl PerHundred {
    fn populated(&self) -> usize {
        [self.calories, self.protein, self.fat, self.carbs]
            .iter()
            .filter(|v| v.is_some())
            .count()
    }
}

impl ProductRecord {
    fn display_name(&self) -> Option<&str> {
        [self.product_name.as_deref(), self.generic_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
    }

    fn per_hundred(&self) -> PerHundred {
        let Some(n) = &self.nutriments else {
            return PerHundred::default();
        };

        let calories = lenient_number(n.energy_kcal_100g.as_ref())
            .or_else(|| lenient_number(n.energy_kj_100g.as_ref()).map(|kj| kj / KJ_PER_KCAL))
            .or_else(|| lenient_number(n.energy_100g.as_ref()).map(|kj| kj / KJ_PER_KCAL));

        PerHundred {
            calories,
            protein: lenient_number(n.proteins_100g.as_ref()),
            fat: lenient_number(n.fat_100g.as_ref()),
            carbs: lenient_number(n.carbohydrates_100g.as_ref()),
        }
    }

    fn serving_text(&self) -> Option<String> {
        match self.serving_size.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn brand(&self) -> Option<String> {
        self.brands
            .as_deref()?
            .split(',')
            .map(str::trim)
            .find(|b| !b.is_empty())
            .map(str::to_owned)
    }

    fn ingredients(&self) -> Option<Vec<String>> {
        let list: Vec<String> = self
            .ingredients_text
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect();
        (!list.is_empty()).then_some(list)
    }
}

fn lenient_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

#[derive(Debug, Clone)]
struct CachedSearch {
    products: Vec<ProductRecord>,
    expires_at: Instant,
}

impl CachedSearch {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Client for the reference nutrition database
pub struct FoodReferenceClient {
    config: ReferenceLookupConfig,
    keywords: KeywordConfig,
    http_client: reqwest::Client,
    search_cache: Arc<RwLock<LruCache<String, CachedSearch>>>,
}

impl FoodReferenceClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when the configuration fails validation, or an
    /// internal error when the HTTP client cannot be built.
    pub fn new(config: ReferenceLookupConfig, keywords: KeywordConfig) -> AppResult<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.rung_timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        let capacity = NonZeroUsize::new(config.max_cache_items).ok_or_else(|| {
            AppError::config_invalid("FOOD_REFERENCE_CACHE_ITEMS", "cache must hold at least one entry")
        })?;

        Ok(Self {
            config,
            keywords,
            http_client,
            search_cache: Arc::new(RwLock::new(LruCache::new(capacity))),
        })
    }

    /// Number of cached search responses (useful for monitoring)
    pub async fn cache_len(&self) -> usize {
        self.search_cache.read().await.len()
    }

    /// Clear the search cache (useful for testing)
    pub async fn clear_cache(&self) {
        self.search_cache.write().await.clear();
    }

    async fn cached(&self, query: &str) -> Option<Vec<ProductRecord>> {
        // LruCache::get is mutable (updates access order)
        let mut cache = self.search_cache.write().await;
        let entry = cache.get(query)?;
        if entry.is_expired() {
            cache.pop(query);
            return None;
        }
        Some(entry.products.clone())
    }

    async fn search(&self, query: &str) -> AppResult<Vec<ProductRecord>> {
        if let Some(products) = self.cached(query).await {
            debug!(query, "Reference search served from cache");
            return Ok(products);
        }

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), self.config.search_path);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("page_size", &self.config.page_size.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()).with_source(e))?;

        if !response.status().is_success() {
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("JSON parse error: {e}"))
        })?;

        // Any shape mismatch counts as "no results"
        let products: Vec<ProductRecord> = body
            .get("products")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        if !products.is_empty() {
            self.search_cache.write().await.push(
                query.to_owned(),
                CachedSearch {
                    products: products.clone(),
                    expires_at: Instant::now() + Duration::from_secs(self.config.cache_ttl_secs),
                },
            );
        }

        Ok(products)
    }
}

#[async_trait]
impl ReferenceLookup for FoodReferenceClient {
    #[instrument(skip(self), fields(service = SERVICE_NAME))]
    async fn lookup(&self, food_name: &str) -> Option<ReferenceCandidate> {
        let rung_timeout = Duration::from_secs(self.config.rung_timeout_secs);

        for query in build_query_ladder(food_name, &self.keywords) {
            match timeout(rung_timeout, self.search(&query)).await {
                Ok(Ok(products)) if !products.is_empty() => {
                    debug!(query = %query, results = products.len(), "Reference rung returned results");
                    // Results from different rungs are never merged
                    return select_best(&products, &query);
                }
                Ok(Ok(_)) => debug!(query = %query, "Reference rung returned no results"),
                Ok(Err(e)) => warn!(query = %query, error = %e, "Reference rung failed"),
                Err(_) => warn!(query = %query, "Reference rung timed out"),
            }
        }

        debug!("Reference lookup exhausted all rungs");
        None
    }
}

/// Ordered queries from most to least specific
///
/// The name is lowercased and filler words are dropped; rungs are the whole
/// cleaned name followed by its first three, two and one tokens, with
/// duplicate rungs removed.
#[must_use]
pub fn build_query_ladder(food_name: &str, keywords: &KeywordConfig) -> Vec<String> {
    let lowered = food_name.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split_whitespace()
        .map(|token| {
            token.trim_matches(|c: char| {
                matches!(c, ',' | '.' | ';' | ':' | '(' | ')' | '"' | '«' | '»' | '!' | '?')
            })
        })
        .filter(|token| !token.is_empty() && !keywords.is_filler(token))
        .collect();

    if tokens.is_empty() {
        return Vec::new();
    }

    let mut ladder = vec![tokens.join(" ")];
    for take in (1..=MAX_LADDER_TOKENS).rev() {
        let rung = tokens[..take.min(tokens.len())].join(" ");
        if ladder.last() != Some(&rung) {
            ladder.push(rung);
        }
    }
    ladder
}

fn completeness_score(name: &str, per_hundred: &PerHundred, query: &str) -> usize {
    let name = name.to_lowercase();
    let query = query.to_lowercase();
    let bonus = if name.contains(&query) || query.contains(&name) {
        NAME_MATCH_BONUS
    } else {
        0
    };
    per_hundred.populated() + bonus
}

fn select_best(products: &[ProductRecord], query: &str) -> Option<ReferenceCandidate> {
    let mut best: Option<(usize, &ProductRecord, &str, PerHundred)> = None;

    for product in products {
        let Some(name) = product.display_name() else {
            continue;
        };
        let per_hundred = product.per_hundred();
        let score = completeness_score(name, &per_hundred, query);
        // Strictly greater keeps the first of equal scores
        if best.as_ref().map_or(true, |(top, ..)| score > *top) {
            best = Some((score, product, name, per_hundred));
        }
    }

    let (score, product, name, per_hundred) = best?;
    debug!(product = name, score, "Selected reference product");
    Some(build_candidate(product, name, per_hundred))
}

fn build_candidate(product: &ProductRecord, name: &str, per_hundred: PerHundred) -> ReferenceCandidate {
    let (portion_size, unit) = parse_serving(product.serving_text().as_deref());
    let factor = if (portion_size - REFERENCE_BASIS).abs() > f64::EPSILON {
        portion_size / REFERENCE_BASIS
    } else {
        1.0
    };
    let scale = |value: Option<f64>| value.map(|v| round_one_decimal((v * factor).max(0.0)));

    ReferenceCandidate {
        food_name: name.to_owned(),
        brand: product.brand(),
        portion_size: round_one_decimal(portion_size),
        unit,
        calories: scale(per_hundred.calories),
        protein: scale(per_hundred.protein),
        fat: scale(per_hundred.fat),
        carbs: scale(per_hundred.carbs),
        ingredients: product.ingredients(),
    }
}

static PARENTHESIZED_SERVING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\(\s*(?P<value>\d+(?:[.,]\d+)?)\s*(?P<unit>[^\d\s)]+)?\s*\)").ok()
});

static LEADING_SERVING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<value>\d+(?:[.,]\d+)?)\s*(?P<unit>[^\d\s(]+)?").ok()
});

/// Resolve a serving-size string such as `"2 biscuits (25 g)"` or `"330ml"`
///
/// A parenthesized amount wins over a leading one. An amount whose unit is
/// not a mass, volume or count token is ignored in either position. Falls
/// back to 100/mass.
fn parse_serving(serving: Option<&str>) -> (f64, PortionUnit) {
    let default = (DEFAULT_PORTION_SIZE, PortionUnit::Mass);
    let Some(serving) = serving else {
        return default;
    };

    let from_caps = |caps: Captures<'_>| {
        let value = caps
            .name("value")?
            .as_str()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)?;
        let unit = match caps.name("unit") {
            Some(token) => PortionUnit::from_token(token.as_str())?,
            None => PortionUnit::Mass,
        };
        Some((value, unit))
    };

    PARENTHESIZED_SERVING
        .as_ref()
        .and_then(|re| re.captures(serving))
        .and_then(from_caps)
        .or_else(|| {
            LEADING_SERVING
                .as_ref()
                .and_then(|re| re.captures(serving))
                .and_then(from_caps)
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(value: Value) -> ProductRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_ladder_strips_fillers_and_dedupes() {
        let keywords = KeywordConfig::default();
        assert_eq!(
            build_query_ladder("Сет Ролл Филадельфия с лососем", &keywords),
            vec![
                "ролл филадельфия с лососем",
                "ролл филадельфия с",
                "ролл филадельфия",
                "ролл",
            ]
        );
        assert_eq!(build_query_ladder("Banana", &keywords), vec!["banana"]);
        assert!(build_query_ladder("  type ", &keywords).is_empty());
    }

    #[test]
    fn test_parse_serving_variants() {
        assert_eq!(parse_serving(Some("2 biscuits (25 g)")), (25.0, PortionUnit::Mass));
        assert_eq!(parse_serving(Some("330ml")), (330.0, PortionUnit::Volume));
        assert_eq!(parse_serving(Some("1 bar")), (100.0, PortionUnit::Mass));
        assert_eq!(parse_serving(Some("45,5 г")), (45.5, PortionUnit::Mass));
        assert_eq!(parse_serving(None), (100.0, PortionUnit::Mass));
        assert_eq!(parse_serving(Some("0 g")), (100.0, PortionUnit::Mass));
        assert_eq!(parse_serving(Some("1 cookie (1 oz)")), (100.0, PortionUnit::Mass));
        assert_eq!(parse_serving(Some("30 g (1 oz)")), (30.0, PortionUnit::Mass));
    }

    #[test]
    fn test_energy_fallbacks() {
        let kj_only = product(json!({
            "product_name": "Juice",
            "nutriments": { "energy-kj_100g": 418.4 }
        }));
        assert_eq!(kj_only.per_hundred().calories.map(round_one_decimal), Some(100.0));

        let unitless = product(json!({
            "product_name": "Juice",
            "nutriments": { "energy_100g": "836.8" }
        }));
        assert_eq!(unitless.per_hundred().calories.map(round_one_decimal), Some(200.0));
    }

    #[test]
    fn test_scoring_prefers_complete_then_first() {
        let products = vec![
            product(json!({ "product_name": "Other", "nutriments": { "proteins_100g": 1 } })),
            product(json!({ "product_name": "Apple pie", "nutriments": { "energy-kcal_100g": 250, "fat_100g": 12 } })),
            product(json!({ "product_name": "Tarte aux pommes", "nutriments": { "energy-kcal_100g": 240, "fat_100g": 11, "carbohydrates_100g": 30 } })),
        ];
        // "Apple pie" contains the query: 2 + 2 beats 3 + 0
        let best = select_best(&products, "apple").unwrap();
        assert_eq!(best.food_name, "Apple pie");

        let tied = vec![
            product(json!({ "product_name": "First", "nutriments": { "fat_100g": 1 } })),
            product(json!({ "product_name": "Second", "nutriments": { "fat_100g": 2 } })),
        ];
        assert_eq!(select_best(&tied, "x").unwrap().food_name, "First");
    }

    #[test]
    fn test_candidate_rescaled_to_serving() {
        let record = product(json!({
            "product_name": "Cookie",
            "brands": "Oreo, Mondelez",
            "serving_size": "150 g",
            "ingredients_text": "flour, sugar, ,cocoa",
            "nutriments": { "energy-kcal_100g": 200, "proteins_100g": 5, "fat_100g": -1 }
        }));
        let candidate = build_candidate(&record, "Cookie", record.per_hundred());

        assert_eq!(candidate.calories, Some(300.0));
        assert_eq!(candidate.protein, Some(7.5));
        assert_eq!(candidate.fat, Some(0.0));
        assert_eq!(candidate.carbs, None);
        assert_eq!(candidate.brand.as_deref(), Some("Oreo"));
        assert_eq!(
            candidate.ingredients,
            Some(vec!["flour".to_owned(), "sugar".to_owned(), "cocoa".to_owned()])
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(ReferenceLookupConfig::default().validate().is_ok());
        let bad = ReferenceLookupConfig {
            page_size: 0,
            ..ReferenceLookupConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
