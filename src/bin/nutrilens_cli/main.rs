// ABOUTME: Nutrilens CLI - command-line front end for the food recognition pipeline
// ABOUTME: Interprets saved model replies, queries the reference database, and runs full recognition
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Interpret a saved model reply (reads stdin when --file is omitted)
//! nutrilens-cli interpret --file reply.txt
//!
//! # Search the reference database
//! nutrilens-cli lookup "Чудо йогурт клубника"
//!
//! # Recognize a meal from text and an optional photo
//! nutrilens-cli recognize --text "Тарелка борща" --image lunch.jpg
//! ```

mod commands;
mod helpers;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use nutrilens::logging::LoggingConfig;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "nutrilens-cli",
    about = "Nutrilens food recognition CLI",
    long_about = "Command-line front end for interpreting model replies, querying the reference nutrition database, and recognizing meals."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Interpret a raw model reply into a nutrition record
    Interpret {
        /// File holding the reply (stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Search the reference database for a food name
    Lookup {
        /// Food name as the model would report it
        name: String,
    },

    /// Run the full recognition pipeline
    Recognize {
        /// Meal description
        #[arg(long)]
        text: Option<String>,

        /// Meal photo (jpeg, png, webp)
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = if cli.verbose {
        LoggingConfig::from_env().with_level("debug")
    } else {
        LoggingConfig::from_env().with_level("warn")
    };
    logging.init()?;
    debug!("Nutrilens CLI starting");

    match cli.command {
        Command::Interpret { file } => commands::interpret::run(file.as_deref()).await,
        Command::Lookup { name } => commands::lookup::run(&name).await,
        Command::Recognize { text, image } => {
            commands::recognize::run(text, image.as_deref()).await
        }
    }
}
