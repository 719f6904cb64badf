// ABOUTME: Nutrition models for recognized food items and reference database candidates
// ABOUTME: NutritionEstimate, ReferenceCandidate, and PortionUnit definitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use crate::constants::{KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN};

/// Round a value to one decimal place
#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn is_zero(value: Option<f64>) -> bool {
    value.is_some_and(|v| v.abs() < f64::EPSILON)
}

/// Measurement basis of a portion
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PortionUnit {
    /// Grams
    #[default]
    Mass,
    /// Millilitres
    Volume,
    /// Pieces
    Count,
}

impl PortionUnit {
    /// Map a free-text unit token ("г", "ml", "шт", ...) to a unit
    ///
    /// Returns `None` for tokens that name none of the three bases.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim().trim_end_matches('.').to_lowercase();
        match token.as_str() {
            "mass" | "г" | "гр" | "g" | "gr" | "gram" | "grams" => Some(Self::Mass),
            "volume" | "мл" | "ml" => Some(Self::Volume),
            "count" | "шт" | "pc" | "pcs" => Some(Self::Count),
            t if t.starts_with("грам") || t.starts_with("gramm") => Some(Self::Mass),
            t if t.starts_with("миллилит") || t.starts_with("millilit") => Some(Self::Volume),
            t if t.starts_with("штук") || t.starts_with("piece") => Some(Self::Count),
            _ => None,
        }
    }

    /// Map a unit token, falling back to mass
    #[must_use]
    pub fn from_str_lossy(token: &str) -> Self {
        Self::from_token(token).unwrap_or_default()
    }

    /// Short label in the source locale
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Mass => "г",
            Self::Volume => "мл",
            Self::Count => "шт",
        }
    }
}

/// Structured nutrition record for one recognized food item
///
/// Built fresh for every recognition request and handed back to the caller;
/// this crate never persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    /// Food label as identified by the model
    pub food_name: String,
    /// Portion amount expressed in `unit`
    pub portion_size: f64,
    /// Portion measurement basis
    pub unit: PortionUnit,
    /// Energy for the portion (kcal)
    pub calories: Option<f64>,
    /// Protein for the portion (grams)
    pub protein: Option<f64>,
    /// Fat for the portion (grams)
    pub fat: Option<f64>,
    /// Carbohydrates for the portion (grams)
    pub carbs: Option<f64>,
}

impl NutritionEstimate {
    /// Create an estimate with no nutrition values
    #[must_use]
    pub fn new(food_name: impl Into<String>, portion_size: f64, unit: PortionUnit) -> Self {
        Self {
            food_name: food_name.into(),
            portion_size,
            unit,
            calories: None,
            protein: None,
            fat: None,
            carbs: None,
        }
    }

    /// True when protein, fat and carbs are all unknown or all exactly zero
    #[must_use]
    pub fn macros_absent(&self) -> bool {
        let all_unknown = self.protein.is_none() && self.fat.is_none() && self.carbs.is_none();
        all_unknown || (is_zero(self.protein) && is_zero(self.fat) && is_zero(self.carbs))
    }

    /// True when at least one of calories, protein, fat or carbs is known
    #[must_use]
    pub fn has_nutrition_signal(&self) -> bool {
        self.calories.is_some()
            || self.protein.is_some()
            || self.fat.is_some()
            || self.carbs.is_some()
    }

    /// Fill unknown macros from the calorie figure
    ///
    /// With no usable macros the whole energy is booked as carbohydrate
    /// (`calories / 4`), a deliberate simplification rather than an estimate of
    /// the real split. With partial macros, unknown protein and fat become zero
    /// and missing carbs are derived from the energy left over.
    ///
    /// `zeros_mean_absent` controls whether an all-zero macro triple counts as
    /// "no macros". Does nothing while calories are unknown.
    pub fn backfill_macros(&mut self, zeros_mean_absent: bool) {
        let Some(calories) = self.calories else {
            return;
        };

        let all_unknown = self.protein.is_none() && self.fat.is_none() && self.carbs.is_none();
        let all_zero =
            zeros_mean_absent && is_zero(self.protein) && is_zero(self.fat) && is_zero(self.carbs);

        if all_unknown || all_zero {
            self.protein = Some(0.0);
            self.fat = Some(0.0);
            self.carbs = Some((calories / KCAL_PER_GRAM_CARBS).max(0.0));
            return;
        }

        let protein = self.protein.unwrap_or(0.0);
        let fat = self.fat.unwrap_or(0.0);
        self.protein = Some(protein);
        self.fat = Some(fat);
        if self.carbs.is_none() {
            let remaining = calories - protein * KCAL_PER_GRAM_PROTEIN - fat * KCAL_PER_GRAM_FAT;
            self.carbs = Some((remaining / KCAL_PER_GRAM_CARBS).max(0.0));
        }
    }

    /// Round portion, calories and macros to one decimal place
    pub fn round_values(&mut self) {
        self.portion_size = round_one_decimal(self.portion_size);
        self.calories = self.calories.map(round_one_decimal);
        self.protein = self.protein.map(round_one_decimal);
        self.fat = self.fat.map(round_one_decimal);
        self.carbs = self.carbs.map(round_one_decimal);
    }
}

/// Nutrition record sourced from the reference database, before reconciliation
///
/// Values are expressed for `portion_size`, not per 100 units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCandidate {
    /// Product title in the reference database
    pub food_name: String,
    /// Brand owner, when the database lists one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Resolved serving amount
    pub portion_size: f64,
    /// Serving measurement basis
    pub unit: PortionUnit,
    /// Energy for the serving (kcal)
    pub calories: Option<f64>,
    /// Protein for the serving (grams)
    pub protein: Option<f64>,
    /// Fat for the serving (grams)
    pub fat: Option<f64>,
    /// Carbohydrates for the serving (grams)
    pub carbs: Option<f64>,
    /// Ingredient list, informational only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
}

impl ReferenceCandidate {
    /// Number of populated fields among calories, protein, fat and carbs (0-4)
    #[must_use]
    pub fn populated_macro_count(&self) -> usize {
        [self.calories, self.protein, self.fat, self.carbs]
            .iter()
            .filter(|v| v.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_tokens() {
        assert_eq!(PortionUnit::from_token("г"), Some(PortionUnit::Mass));
        assert_eq!(PortionUnit::from_token("граммов"), Some(PortionUnit::Mass));
        assert_eq!(PortionUnit::from_token("ML"), Some(PortionUnit::Volume));
        assert_eq!(PortionUnit::from_token("шт."), Some(PortionUnit::Count));
        assert_eq!(PortionUnit::from_token("штуки"), Some(PortionUnit::Count));
        assert_eq!(PortionUnit::from_token("ложка"), None);
        assert_eq!(PortionUnit::from_str_lossy("ложка"), PortionUnit::Mass);
    }

    #[test]
    fn test_backfill_all_unknown_books_energy_as_carbs() {
        let mut estimate = NutritionEstimate::new("Сок", 200.0, PortionUnit::Volume);
        estimate.calories = Some(90.0);
        estimate.backfill_macros(true);

        assert_eq!(estimate.protein, Some(0.0));
        assert_eq!(estimate.fat, Some(0.0));
        assert_eq!(estimate.carbs, Some(22.5));
    }

    #[test]
    fn test_backfill_derives_missing_carbs() {
        let mut estimate = NutritionEstimate::new("Омлет", 150.0, PortionUnit::Mass);
        estimate.calories = Some(250.0);
        estimate.protein = Some(15.0);
        estimate.fat = Some(18.0);
        estimate.backfill_macros(true);

        // (250 - 60 - 162) / 4 = 7
        assert_eq!(estimate.carbs, Some(7.0));
    }

    #[test]
    fn test_backfill_never_negative_and_fills_unknown_fat() {
        let mut estimate = NutritionEstimate::new("Стейк", 200.0, PortionUnit::Mass);
        estimate.calories = Some(100.0);
        estimate.protein = Some(40.0);
        estimate.backfill_macros(true);

        assert_eq!(estimate.fat, Some(0.0));
        assert_eq!(estimate.carbs, Some(0.0));
    }

    #[test]
    fn test_backfill_keeps_explicit_zeros_when_asked() {
        let mut estimate = NutritionEstimate::new("Чай", 250.0, PortionUnit::Volume);
        estimate.calories = Some(2.0);
        estimate.protein = Some(0.0);
        estimate.fat = Some(0.0);
        estimate.carbs = Some(0.0);
        estimate.backfill_macros(false);

        assert_eq!(estimate.carbs, Some(0.0));
        assert!(estimate.macros_absent());
    }

    #[test]
    fn test_populated_macro_count() {
        let candidate = ReferenceCandidate {
            food_name: "Snickers".into(),
            brand: None,
            portion_size: 50.0,
            unit: PortionUnit::Mass,
            calories: Some(244.0),
            protein: Some(4.5),
            fat: None,
            carbs: Some(30.0),
            ingredients: None,
        };
        assert_eq!(candidate.populated_macro_count(), 3);
    }
}
