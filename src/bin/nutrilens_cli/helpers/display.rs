// ABOUTME: Output formatting helpers for nutrilens-cli
// ABOUTME: Prints results as pretty JSON and the raw reply when nothing was extracted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::Result;
use serde::Serialize;

/// Print any serializable result as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The reply held no nutrition figures; show it as plain text
pub fn print_no_structured_data(raw: &str) {
    println!("No structured nutrition data in the reply:");
    println!("{}", "=".repeat(60));
    println!("{}", raw.trim());
}
