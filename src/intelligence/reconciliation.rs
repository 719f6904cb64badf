// ABOUTME: Arbitrates between the model's nutrition estimate and a reference candidate
// ABOUTME: Trusts reference numbers only with macro absence or brand/lexical corroboration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Reconciliation Engine
//!
//! Branches are evaluated in order and the first true one decides:
//!
//! 1. The model gave no usable macros (all unknown or all zero) and the
//!    candidate has at least three of its four nutrition fields.
//! 2. The candidate is a known brand and the model name is neither a generic
//!    dish nor unrelated: either it is branded too, or the first word of one
//!    name appears in the other.
//! 3. Otherwise the model keeps its own numbers.
//!
//! The food name always comes from the model estimate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::keywords::{contains_keyword, KeywordConfig};
use crate::models::{NutritionEstimate, ReferenceCandidate};

/// Minimum populated nutrition fields a candidate needs to replace absent model macros
pub const MIN_CANDIDATE_FIELDS_FOR_OVERRIDE: usize = 3;

/// Which source supplied the final numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileDecision {
    /// No candidate was available
    NoCandidate,
    /// Candidate numbers replaced absent model macros
    ModelMacrosAbsent,
    /// Candidate numbers used on brand or name corroboration
    BrandCorroborated,
    /// Model numbers kept
    KeptModel,
}

impl ReconcileDecision {
    /// True when the final numbers came from the reference candidate
    #[must_use]
    pub const fn used_reference(&self) -> bool {
        matches!(self, Self::ModelMacrosAbsent | Self::BrandCorroborated)
    }
}

/// Final estimate with the decision that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciled {
    /// Final nutrition record
    pub estimate: NutritionEstimate,
    /// Arbitration outcome
    pub decision: ReconcileDecision,
}

/// Combine a model estimate with an optional reference candidate
#[must_use]
pub fn reconcile(
    model: NutritionEstimate,
    candidate: Option<&ReferenceCandidate>,
    keywords: &KeywordConfig,
) -> Reconciled {
    let Some(candidate) = candidate else {
        return Reconciled {
            estimate: model,
            decision: ReconcileDecision::NoCandidate,
        };
    };

    let decision = arbitrate(&model, candidate, keywords);
    debug!(
        model_name = %model.food_name,
        candidate_name = %candidate.food_name,
        decision = ?decision,
        "Reconciliation decided"
    );

    let estimate = if decision.used_reference() {
        adopt_candidate_numbers(model.food_name, candidate)
    } else {
        model
    };
    Reconciled { estimate, decision }
}

fn arbitrate(
    model: &NutritionEstimate,
    candidate: &ReferenceCandidate,
    keywords: &KeywordConfig,
) -> ReconcileDecision {
    if model.macros_absent()
        && candidate.populated_macro_count() >= MIN_CANDIDATE_FIELDS_FOR_OVERRIDE
    {
        return ReconcileDecision::ModelMacrosAbsent;
    }

    if brand_corroborated(model, candidate, keywords) {
        return ReconcileDecision::BrandCorroborated;
    }

    ReconcileDecision::KeptModel
}

fn brand_corroborated(
    model: &NutritionEstimate,
    candidate: &ReferenceCandidate,
    keywords: &KeywordConfig,
) -> bool {
    let candidate_branded = keywords.matches_brand(&candidate.food_name)
        || candidate
            .brand
            .as_deref()
            .is_some_and(|brand| keywords.matches_brand(brand));
    if !candidate_branded || keywords.is_generic_dish(&model.food_name) {
        return false;
    }

    keywords.matches_brand(&model.food_name)
        || names_share_lead_token(&model.food_name, &candidate.food_name)
}

/// True when the first word of either name starts a word in the other
fn names_share_lead_token(left: &str, right: &str) -> bool {
    let left = left.to_lowercase();
    let right = right.to_lowercase();

    let appears_in = |name: &str, other: &str| {
        lead_token(name).is_some_and(|token| contains_keyword(other, token))
    };
    appears_in(&left, &right) || appears_in(&right, &left)
}

fn lead_token(name: &str) -> Option<&str> {
    name.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|token| !token.is_empty())
}

fn adopt_candidate_numbers(food_name: String, candidate: &ReferenceCandidate) -> NutritionEstimate {
    let mut estimate = NutritionEstimate::new(food_name, candidate.portion_size, candidate.unit);
    estimate.calories = candidate.calories;
    estimate.protein = candidate.protein;
    estimate.fat = candidate.fat;
    estimate.carbs = candidate.carbs;
    estimate.backfill_macros(false);
    estimate.round_values();
    estimate
}
