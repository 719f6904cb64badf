// ABOUTME: Main library entry point for the Nutrilens food-recognition pipeline
// ABOUTME: Turns model replies and reference lookups into one reconciled nutrition record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Nutrilens
//!
//! Core of a nutrition tracker's food recognition: a text/vision model
//! describes a meal, an external reference database is searched for the same
//! item, and the two are reconciled into one `NutritionEstimate`.
//!
//! ## Architecture
//!
//! - **Concurrency**: FIFO gate capping simultaneous inference calls
//! - **Intelligence**: reply interpretation and reconciliation (pure functions)
//! - **External**: reference database client with query relaxation
//! - **LLM**: inference provider abstraction
//! - **Services**: the end-to-end recognition pipeline
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nutrilens::intelligence::interpret;
//!
//! let reply = r#"{"foodName":"Банан","portionSize":120,"unit":"г","calories":107,"protein":1.3,"fat":0.4,"carbs":27.6}"#;
//! if let Some(result) = interpret(reply) {
//!     println!("{} - {:?} kcal", result.estimate.food_name, result.estimate.calories);
//! }
//! ```

/// Unified error handling (re-exported from `nutrilens-core`)
pub use nutrilens_core::errors;

/// Nutrition constants (re-exported from `nutrilens-core`)
pub use nutrilens_core::constants;

/// Nutrition data models (re-exported from `nutrilens-core`)
pub use nutrilens_core::models;

/// Bounded-concurrency gate for inference calls
pub mod concurrency;

/// Environment configuration and keyword dictionaries
pub mod config;

/// Reference nutrition database client
pub mod external;

/// Reply interpretation and reconciliation
pub mod intelligence;

/// Inference provider abstraction
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Recognition pipeline service
pub mod services;
