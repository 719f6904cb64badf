// ABOUTME: Nutrition intelligence: reply interpretation and source reconciliation
// ABOUTME: Pure, stateless functions over model replies and reference candidates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Intelligence Module
//!
//! Turns a raw model reply into a [`NutritionEstimate`](crate::models::NutritionEstimate)
//! and decides whether reference database numbers should replace the model's.

/// Arbitration between model estimates and reference candidates
pub mod reconciliation;
/// Structured-then-heuristic parsing of model replies
pub mod response_interpreter;

pub use reconciliation::{reconcile, ReconcileDecision, Reconciled};
pub use response_interpreter::{
    extract_field, field_ladder, interpret, normalize_text, Interpretation, NutrientField,
    ParseStrategy,
};
