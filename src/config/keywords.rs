// ABOUTME: Keyword dictionaries driving query relaxation and reconciliation arbitration
// ABOUTME: Brand names, generic dish names, and filler words kept as data, not control flow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Keyword Dictionaries
//!
//! Three lowercase word lists:
//! - **brands**: packaged-product brands whose label nutrition the reference
//!   database captures exactly
//! - **generic dishes**: freeform dish names that must never pull in
//!   brand-specific reference numbers
//! - **filler words**: meta words removed from lookup queries
//!
//! Lists are extended at runtime through `RecognitionConfig::from_env`.

use serde::{Deserialize, Serialize};

const DEFAULT_BRANDS: &[&str] = &[
    "coca-cola",
    "кока-кола",
    "pepsi",
    "пепси",
    "fanta",
    "sprite",
    "snickers",
    "сникерс",
    "mars",
    "twix",
    "bounty",
    "kitkat",
    "kit kat",
    "milka",
    "милка",
    "alpen gold",
    "альпен гольд",
    "nestle",
    "нестле",
    "danone",
    "данон",
    "activia",
    "активиа",
    "растишка",
    "простоквашино",
    "домик в деревне",
    "агуша",
    "valio",
    "валио",
    "president",
    "lay's",
    "lays",
    "лейс",
    "pringles",
    "принглс",
    "doritos",
    "cheetos",
    "oreo",
    "орео",
    "nutella",
    "нутелла",
    "kinder",
    "киндер",
    "ferrero",
    "raffaello",
    "m&m's",
    "barilla",
    "heinz",
    "макфа",
    "red bull",
    "lipton",
    "nescafe",
    "jacobs",
    "starbucks",
    "mcdonald's",
    "макдоналдс",
    "kfc",
    "burger king",
    "бургер кинг",
    "вкусно и точка",
    "теремок",
    "эрмигурт",
    "савушкин",
    "fruttis",
];

const DEFAULT_GENERIC_DISHES: &[&str] = &[
    "суп",
    "борщ",
    "щи",
    "солянка",
    "салат",
    "бургер",
    "гамбургер",
    "пицца",
    "паста",
    "макароны",
    "плов",
    "каша",
    "омлет",
    "яичница",
    "котлета",
    "пельмени",
    "вареники",
    "блины",
    "оладьи",
    "шашлык",
    "рагу",
    "гуляш",
    "ролл",
    "суши",
    "шаурма",
    "бутерброд",
    "soup",
    "salad",
    "burger",
    "pizza",
    "pasta",
    "stew",
    "omelette",
    "porridge",
    "sandwich",
    "sushi",
];

const DEFAULT_FILLER_WORDS: &[&str] = &[
    "type", "variety", "set", "kind", "style", "тип", "сорт", "вид", "набор", "сет", "порция",
];

/// Brand, generic-dish, and filler-word dictionaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Packaged-product brand names
    pub brands: Vec<String>,
    /// Freeform dish names
    pub generic_dishes: Vec<String>,
    /// Words dropped from lookup queries
    pub filler_words: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            brands: to_owned_list(DEFAULT_BRANDS),
            generic_dishes: to_owned_list(DEFAULT_GENERIC_DISHES),
            filler_words: to_owned_list(DEFAULT_FILLER_WORDS),
        }
    }
}

impl KeywordConfig {
    /// Append extra brand names (deduplicated, lowercased)
    #[must_use]
    pub fn with_extra_brands(mut self, extra: &[String]) -> Self {
        extend_unique(&mut self.brands, extra);
        self
    }

    /// Append extra generic dish names (deduplicated, lowercased)
    #[must_use]
    pub fn with_extra_generic_dishes(mut self, extra: &[String]) -> Self {
        extend_unique(&mut self.generic_dishes, extra);
        self
    }

    /// Append extra filler words (deduplicated, lowercased)
    #[must_use]
    pub fn with_extra_filler_words(mut self, extra: &[String]) -> Self {
        extend_unique(&mut self.filler_words, extra);
        self
    }

    /// True when `name` mentions a known brand
    #[must_use]
    pub fn matches_brand(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.brands.iter().any(|brand| contains_keyword(&name, brand))
    }

    /// True when `name` mentions a generic dish
    #[must_use]
    pub fn is_generic_dish(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.generic_dishes
            .iter()
            .any(|dish| contains_keyword(&name, dish))
    }

    /// True when `token` is a filler word (exact, case-insensitive)
    #[must_use]
    pub fn is_filler(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.filler_words.iter().any(|word| *word == token)
    }
}

/// True when `keyword` occurs in `haystack` at the start of a word
///
/// Both arguments are expected in lowercase. "суп" matches "суп дня" and
/// "супы" but not "пересуп".
#[must_use]
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    haystack.match_indices(keyword).any(|(start, _)| {
        haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

fn to_owned_list(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_owned()).collect()
}

fn extend_unique(target: &mut Vec<String>, extra: &[String]) {
    for word in extra {
        let word = word.trim().to_lowercase();
        if !word.is_empty() && !target.contains(&word) {
            target.push(word);
        }
    }
}
