// ABOUTME: Core types and constants for the Nutrilens food-recognition pipeline
// ABOUTME: Foundation crate with error handling, nutrition models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Nutrilens Core
//!
//! Foundation crate providing shared types and constants for the Nutrilens
//! food-recognition pipeline. This crate is designed to change infrequently,
//! enabling incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Energy conversion factors and nutrition defaults
//! - **models**: `NutritionEstimate`, `ReferenceCandidate`, and `PortionUnit`

/// Unified error handling system with standard error codes
pub mod errors;

/// Nutrition constants (energy factors, default portions)
pub mod constants;

/// Core nutrition data models
pub mod models;
