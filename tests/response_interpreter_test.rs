// ABOUTME: Integration tests for model reply interpretation
// ABOUTME: Covers structured JSON replies, Markdown prose, pattern precedence, and empty replies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use nutrilens::intelligence::{extract_field, interpret, normalize_text, NutrientField, ParseStrategy};
use nutrilens::models::PortionUnit;

#[test]
fn test_structured_reply_is_returned_unchanged() {
    common::init_test_logging();
    let raw = r#"{"foodName":"Банан","portionSize":120,"unit":"г","calories":107,"protein":1.3,"fat":0.4,"carbs":27.6}"#;

    let result = interpret(raw).unwrap();
    assert_eq!(result.strategy, ParseStrategy::Structured);

    let estimate = result.estimate;
    assert_eq!(estimate.food_name, "Банан");
    assert!((estimate.portion_size - 120.0).abs() < f64::EPSILON);
    assert_eq!(estimate.unit, PortionUnit::Mass);
    assert_eq!(estimate.calories, Some(107.0));
    assert_eq!(estimate.protein, Some(1.3));
    assert_eq!(estimate.fat, Some(0.4));
    assert_eq!(estimate.carbs, Some(27.6));
}

#[test]
fn test_calories_only_prose_books_energy_as_carbs() {
    let result = interpret("Калории: 400 ккал").unwrap();

    assert_eq!(result.strategy, ParseStrategy::Heuristic);
    assert_eq!(result.estimate.calories, Some(400.0));
    assert_eq!(result.estimate.protein, Some(0.0));
    assert_eq!(result.estimate.fat, Some(0.0));
    assert_eq!(result.estimate.carbs, Some(100.0));
    assert!((result.estimate.portion_size - 100.0).abs() < f64::EPSILON);
}

#[test]
fn test_reply_without_figures_is_none() {
    assert!(interpret("").is_none());
    assert!(interpret("   \n  ").is_none());
    assert!(interpret("no numbers here").is_none());
    assert!(interpret("Не удалось распознать блюдо на фото.").is_none());
}

#[test]
fn test_markdown_reply_with_emphasis_and_decimal_comma() {
    let raw = "**Борщ с говядиной**\n\n\
               - **Размер порции:** 300 г\n\
               - **Калории:** 250 ккал\n\
               - **Белки:** 12,5 г\n\
               - **Жиры:** 10 г\n\
               - **Углеводы:** 28 г\n";

    let result = interpret(raw).unwrap();
    assert_eq!(result.strategy, ParseStrategy::Heuristic);

    let estimate = result.estimate;
    assert_eq!(estimate.food_name, "Борщ с говядиной");
    assert!((estimate.portion_size - 300.0).abs() < f64::EPSILON);
    assert_eq!(estimate.unit, PortionUnit::Mass);
    assert_eq!(estimate.calories, Some(250.0));
    assert_eq!(estimate.protein, Some(12.5));
    assert_eq!(estimate.fat, Some(10.0));
    assert_eq!(estimate.carbs, Some(28.0));
}

#[test]
fn test_fenced_json_with_string_numbers_backfills_carbs() {
    let raw = "```json\n{\"food_name\": \"Овсянка\", \"portion_size\": \"250\", \"unit\": \"g\", \"calories\": \"180,5\", \"protein\": 6}\n```";

    let result = interpret(raw).unwrap();
    assert_eq!(result.strategy, ParseStrategy::Structured);

    let estimate = result.estimate;
    assert_eq!(estimate.food_name, "Овсянка");
    assert!((estimate.portion_size - 250.0).abs() < f64::EPSILON);
    assert_eq!(estimate.calories, Some(180.5));
    assert_eq!(estimate.protein, Some(6.0));
    assert_eq!(estimate.fat, Some(0.0));
    // (180.5 - 6 * 4) / 4
    assert_eq!(estimate.carbs, Some(39.1));
}

#[test]
fn test_structured_explicit_zeros_are_kept() {
    let raw = r#"{"foodName":"Вода","portionSize":250,"unit":"мл","calories":0,"protein":0,"fat":0,"carbs":0}"#;

    let estimate = interpret(raw).unwrap().estimate;
    assert_eq!(estimate.unit, PortionUnit::Volume);
    assert_eq!(estimate.calories, Some(0.0));
    assert_eq!(estimate.carbs, Some(0.0));
}

#[test]
fn test_structured_non_positive_portion_defaults() {
    let raw = r#"{"foodName":"Яблоко","portionSize":0,"calories":52,"protein":0.3,"fat":0.2,"carbs":14}"#;

    let estimate = interpret(raw).unwrap().estimate;
    assert!((estimate.portion_size - 100.0).abs() < f64::EPSILON);
    assert_eq!(estimate.unit, PortionUnit::Mass);
}

#[test]
fn test_structured_reply_without_figures_is_none() {
    assert!(interpret(r#"{"foodName":"Яблоко","portionSize":150}"#).is_none());
}

#[test]
fn test_structured_null_calories_not_reread_as_prose() {
    // portionSize must not be picked up as a calorie figure
    assert!(interpret(r#"{"foodName":"Яблоко","calories":null,"portionSize":150}"#).is_none());
    assert!(interpret(r#"{"foodName":"  ","portionSize":150,"calories":80}"#).is_none());
}

#[test]
fn test_structured_unparseable_portion_defaults() {
    let raw = r#"{"foodName":"Яблоко","portionSize":"средняя","calories":52}"#;

    let result = interpret(raw).unwrap();
    assert_eq!(result.strategy, ParseStrategy::Structured);
    assert!((result.estimate.portion_size - 100.0).abs() < f64::EPSILON);
}

#[test]
fn test_schema_mismatch_falls_back_to_heuristic() {
    let result = interpret(r#"{"dish": "Яблоко", "calories": 52}"#).unwrap();
    assert_eq!(result.strategy, ParseStrategy::Heuristic);
    assert_eq!(result.estimate.calories, Some(52.0));
}

#[test]
fn test_energy_unit_rung_beats_loose_proximity() {
    let text = normalize_text("Калорийность блюда на 200 г порции составляет 350 ккал");
    assert_eq!(extract_field(&text, NutrientField::Calories), Some(350.0));
}

#[test]
fn test_number_before_label() {
    let text = normalize_text("В порции около 30 г белка и 12 г жиров");
    assert_eq!(extract_field(&text, NutrientField::Protein), Some(30.0));
    assert_eq!(extract_field(&text, NutrientField::Fat), Some(12.0));
    assert_eq!(extract_field(&text, NutrientField::Carbs), None);
}

#[test]
fn test_english_labels() {
    let text = normalize_text("Calories: 95 kcal\nProtein: 0.5 g\nFat: 0.3 g\nCarbs: 25 g");
    assert_eq!(extract_field(&text, NutrientField::Calories), Some(95.0));
    assert_eq!(extract_field(&text, NutrientField::Protein), Some(0.5));
    assert_eq!(extract_field(&text, NutrientField::Fat), Some(0.3));
    assert_eq!(extract_field(&text, NutrientField::Carbs), Some(25.0));
}

#[test]
fn test_macro_label_inside_word_is_not_a_label() {
    let result = interpret("Обезжиренный творог 200 г, 180 ккал").unwrap();

    assert_eq!(result.estimate.calories, Some(180.0));
    assert_eq!(result.estimate.fat, Some(0.0));
    assert_eq!(result.estimate.protein, Some(0.0));
    assert_eq!(result.estimate.carbs, Some(45.0));
}

#[test]
fn test_portion_weight_not_booked_as_protein() {
    let result = interpret("Безбелковый хлеб, порция 50 г\nКалории: 120 ккал").unwrap();

    assert!((result.estimate.portion_size - 50.0).abs() < f64::EPSILON);
    assert_eq!(result.estimate.calories, Some(120.0));
    assert_eq!(result.estimate.protein, Some(0.0));
    assert_eq!(result.estimate.carbs, Some(30.0));

    let text = normalize_text("Безбелковый хлеб, порция 50 г");
    assert_eq!(extract_field(&text, NutrientField::Protein), None);
}
