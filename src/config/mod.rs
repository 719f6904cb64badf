// ABOUTME: Configuration module for the recognition pipeline
// ABOUTME: Environment-driven settings plus the keyword dictionaries used by arbitration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! - **Environment**: gate and reference lookup settings from environment variables
//! - **Keywords**: brand, generic-dish and filler-word dictionaries

/// Environment-based pipeline configuration
pub mod environment;
/// Keyword dictionaries for query relaxation and reconciliation
pub mod keywords;

pub use environment::{GateConfig, RecognitionConfig};
pub use keywords::KeywordConfig;
