// ABOUTME: Lookup command for nutrilens-cli
// ABOUTME: Queries the reference nutrition database with the relaxation ladder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::Result;
use nutrilens::config::RecognitionConfig;
use nutrilens::external::{build_query_ladder, FoodReferenceClient, ReferenceLookup};
use tracing::debug;

use crate::helpers::display::print_json;

/// Look one food name up
pub async fn run(name: &str) -> Result<()> {
    let config = RecognitionConfig::from_env()?;
    debug!(ladder = ?build_query_ladder(name, &config.keywords), "Query ladder");

    let client = FoodReferenceClient::new(config.reference, config.keywords)?;
    match client.lookup(name).await {
        Some(candidate) => print_json(&candidate)?,
        None => println!("No reference product found for '{name}'"),
    }
    Ok(())
}
