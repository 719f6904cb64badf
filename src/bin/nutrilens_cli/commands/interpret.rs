// ABOUTME: Interpret command for nutrilens-cli
// ABOUTME: Reads a raw model reply from a file or stdin and prints the extracted record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::Path;

use anyhow::{Context, Result};
use nutrilens::intelligence::interpret;
use tokio::fs;
use tokio::io::{stdin, AsyncReadExt};
use tracing::info;

use crate::helpers::display::{print_json, print_no_structured_data};

/// Interpret one reply
pub async fn run(file: Option<&Path>) -> Result<()> {
    let raw = match file {
        Some(path) => fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read model reply from stdin")?;
            buffer
        }
    };

    match interpret(&raw) {
        Some(interpretation) => {
            info!(strategy = ?interpretation.strategy, "Reply interpreted");
            print_json(&interpretation)?;
        }
        None => print_no_structured_data(&raw),
    }
    Ok(())
}
