// ABOUTME: System prompts for food recognition inference loaded at compile time
// ABOUTME: Provides the prompt requesting a strict JSON nutrition object
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.

/// Food recognition system prompt
///
/// Asks for a single JSON object with `foodName`, `portionSize`, `unit`,
/// `calories`, `protein`, `fat` and `carbs`. Models do not always comply,
/// which is why the interpreter also reads prose replies.
pub const FOOD_RECOGNITION_PROMPT: &str = include_str!("food_recognition.md");

/// Get the food recognition system prompt
#[must_use]
pub const fn food_recognition_prompt() -> &'static str {
    FOOD_RECOGNITION_PROMPT
}
