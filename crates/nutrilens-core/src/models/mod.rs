// ABOUTME: Core data models for the food-recognition pipeline
// ABOUTME: Re-exports nutrition estimates, reference candidates, and portion units
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Core data models

/// Nutrition estimate, reference candidate, and portion unit definitions
pub mod nutrition;

pub use nutrition::{round_one_decimal, NutritionEstimate, PortionUnit, ReferenceCandidate};
