// ABOUTME: Domain service layer for the food recognition pipeline
// ABOUTME: Protocol-agnostic services reusable by any request-handling layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Services hold no transport concerns; the HTTP or bot layer calling them is
//! an external collaborator.

/// Recognition pipeline: gate, inference, interpretation, lookup, reconciliation
pub mod food_recognition;

pub use food_recognition::{FoodRecognitionService, RecognitionInput, RecognitionOutcome};
