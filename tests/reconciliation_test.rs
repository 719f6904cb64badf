// ABOUTME: Integration tests for reconciliation between model estimates and reference candidates
// ABOUTME: Validates each arbitration branch and that the model's food name always survives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{candidate, model_estimate};
use nutrilens::config::KeywordConfig;
use nutrilens::intelligence::{reconcile, ReconcileDecision};

#[test]
fn test_absent_macros_take_branded_candidate_numbers() {
    let keywords = KeywordConfig::default();
    let model = model_estimate("Ролл Филадельфия", 300.0, 0.0, 0.0, 0.0);
    let reference = candidate("Ролл Филадельфия Теремок", 150.0, 350.0, 12.0, 9.0, 55.0);

    let result = reconcile(model, Some(&reference), &keywords);

    assert_eq!(result.decision, ReconcileDecision::ModelMacrosAbsent);
    assert_eq!(result.estimate.food_name, "Ролл Филадельфия");
    assert!((result.estimate.portion_size - 150.0).abs() < f64::EPSILON);
    assert_eq!(result.estimate.calories, Some(350.0));
    assert_eq!(result.estimate.protein, Some(12.0));
    assert_eq!(result.estimate.fat, Some(9.0));
    assert_eq!(result.estimate.carbs, Some(55.0));
}

#[test]
fn test_generic_dish_keeps_model_macros() {
    let keywords = KeywordConfig::default();
    let model = model_estimate("суп", 120.0, 5.0, 4.0, 15.0);
    let reference = candidate("Ролл Филадельфия Теремок", 150.0, 350.0, 12.0, 9.0, 55.0);

    let result = reconcile(model.clone(), Some(&reference), &keywords);

    assert_eq!(result.decision, ReconcileDecision::KeptModel);
    assert_eq!(result.estimate, model);
}

#[test]
fn test_no_candidate_returns_model_unchanged() {
    let keywords = KeywordConfig::default();
    let model = model_estimate("Гречка с котлетой", 420.0, 22.0, 15.0, 48.0);

    let result = reconcile(model.clone(), None, &keywords);

    assert_eq!(result.decision, ReconcileDecision::NoCandidate);
    assert!(!result.decision.used_reference());
    assert_eq!(result.estimate, model);
}

#[test]
fn test_branded_model_name_adopts_branded_candidate() {
    let keywords = KeywordConfig::default();
    let model = model_estimate("Сникерс", 250.0, 4.0, 12.0, 30.0);
    let mut reference = candidate("Snickers батончик", 50.0, 244.0, 4.5, 12.0, 30.0);
    reference.brand = Some("Mars".to_owned());

    let result = reconcile(model, Some(&reference), &keywords);

    assert_eq!(result.decision, ReconcileDecision::BrandCorroborated);
    assert!(result.decision.used_reference());
    assert_eq!(result.estimate.food_name, "Сникерс");
    assert_eq!(result.estimate.calories, Some(244.0));
    assert_eq!(result.estimate.protein, Some(4.5));
}

#[test]
fn test_shared_lead_word_corroborates_brand_owner() {
    let keywords = KeywordConfig::default();
    let model = model_estimate("Йогурт клубничный", 110.0, 4.0, 2.5, 16.0);
    let mut reference = candidate("Йогурт питьевой клубника", 270.0, 189.0, 7.6, 6.5, 25.0);
    reference.brand = Some("Danone".to_owned());

    let result = reconcile(model, Some(&reference), &keywords);

    assert_eq!(result.decision, ReconcileDecision::BrandCorroborated);
    assert_eq!(result.estimate.food_name, "Йогурт клубничный");
    assert_eq!(result.estimate.calories, Some(189.0));
}

#[test]
fn test_unrelated_branded_candidate_is_ignored() {
    let keywords = KeywordConfig::default();
    let model = model_estimate("Овсяное печенье", 400.0, 6.0, 15.0, 60.0);
    let reference = candidate("Oreo", 100.0, 480.0, 5.0, 20.0, 69.0);

    let result = reconcile(model.clone(), Some(&reference), &keywords);

    assert_eq!(result.decision, ReconcileDecision::KeptModel);
    assert_eq!(result.estimate, model);
}

#[test]
fn test_sparse_candidate_cannot_replace_absent_macros() {
    let keywords = KeywordConfig::default();
    let model = model_estimate("Гречка", 130.0, 0.0, 0.0, 0.0);
    let mut reference = candidate("Гречка отварная", 100.0, 110.0, 4.2, 1.1, 21.3);
    reference.fat = None;
    reference.carbs = None;

    let result = reconcile(model.clone(), Some(&reference), &keywords);

    assert_eq!(result.decision, ReconcileDecision::KeptModel);
    assert_eq!(result.estimate, model);
}

#[test]
fn test_adopted_candidate_backfills_missing_carbs() {
    let keywords = KeywordConfig::default();
    let mut model = model_estimate("Сырники", 300.0, 0.0, 0.0, 0.0);
    model.protein = None;
    model.fat = None;
    model.carbs = None;
    let mut reference = candidate("Сырники творожные", 100.0, 200.0, 10.0, 5.0, 0.0);
    reference.carbs = None;

    let result = reconcile(model, Some(&reference), &keywords);

    assert_eq!(result.decision, ReconcileDecision::ModelMacrosAbsent);
    // (200 - 10 * 4 - 5 * 9) / 4
    assert_eq!(result.estimate.carbs, Some(28.8));
}

#[test]
fn test_extra_brand_keywords_extend_detection() {
    let keywords = KeywordConfig::default().with_extra_brands(&["чудо".to_owned()]);
    let model = model_estimate("Чудо коктейль", 200.0, 6.0, 5.0, 30.0);
    let reference = candidate("Коктейль молочный Чудо", 200.0, 180.0, 6.0, 4.0, 28.0);

    let result = reconcile(model, Some(&reference), &keywords);
    assert_eq!(result.decision, ReconcileDecision::BrandCorroborated);
}
