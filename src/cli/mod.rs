// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod documents;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// PDFmate CLI
#[derive(Parser, Debug)]
#[command(name = "pdfmate-cli")]
#[command(version)]
#[command(about = "Inspect PDFs and ask questions about them locally", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a PDF and print its metadata and chunking
    Inspect(documents::InspectArgs),

    /// Ask one question about a PDF using the configured OpenAI models
    Ask(documents::AskArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Inspect(args) => documents::inspect(args).await,
        Commands::Ask(args) => documents::ask(args).await,
    }
}
