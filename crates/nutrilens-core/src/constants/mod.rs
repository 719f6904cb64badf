// ABOUTME: Nutrition constants for energy conversion and portion defaults
// ABOUTME: Provides named constants to eliminate magic numbers in nutrition arithmetic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Atwater energy factors, the kilojoule conversion used by reference
//! databases, and the defaults applied when a portion cannot be determined.

/// Kilocalories per gram of protein (Atwater factor)
pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;

/// Kilocalories per gram of fat (Atwater factor)
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// Kilocalories per gram of carbohydrate (Atwater factor)
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;

/// Kilojoules per kilocalorie
pub const KJ_PER_KCAL: f64 = 4.184;

/// Portion size assumed when none is stated (reference values are per 100 units)
pub const DEFAULT_PORTION_SIZE: f64 = 100.0;

/// Basis of reference database nutrient values
pub const REFERENCE_BASIS: f64 = 100.0;

/// Default cap on simultaneous upstream inference calls
pub const DEFAULT_MAX_CONCURRENT_INFERENCE: usize = 4;
