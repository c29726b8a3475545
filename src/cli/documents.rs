// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::{ConfigError, OpenAiConfig, RagConfig};
use crate::llm::OpenAiClient;
use crate::pdf::{parse_pdf, ParsedPdf};
use crate::rag::{ExplanationLevel, RagPipeline, RecursiveCharacterTextSplitter};

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// PDF file to parse
    pub file: PathBuf,

    /// Print the text length of every page
    #[arg(long)]
    pub pages: bool,

    /// Characters per chunk
    #[arg(long, default_value_t = 1000)]
    pub chunk_size: usize,

    /// Characters of overlap for recursive chunks
    #[arg(long, default_value_t = 200)]
    pub chunk_overlap: usize,
}

/// Arguments for the ask command
#[derive(Args, Debug)]
pub struct AskArgs {
    /// PDF file to ask about
    pub file: PathBuf,

    /// The question
    pub question: String,

    /// Audience of the answer ("Five Year Old", "High Schooler",
    /// "College Student", "Expert")
    #[arg(long)]
    pub level: Option<ExplanationLevel>,

    /// Retrieved chunks per question (defaults to RAG_TOP_K)
    #[arg(long)]
    pub top_k: Option<usize>,
}

fn read_pdf(path: &Path, chunk_size: usize) -> Result<ParsedPdf> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_pdf(&bytes, chunk_size).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Print metadata and chunk statistics for a local PDF
pub async fn inspect(args: InspectArgs) -> Result<()> {
    if args.chunk_overlap >= args.chunk_size {
        return Err(anyhow!(
            "--chunk-overlap ({}) must be smaller than --chunk-size ({})",
            args.chunk_overlap,
            args.chunk_size
        ));
    }
    let parsed = read_pdf(&args.file, args.chunk_size)?;
    let metadata = &parsed.metadata;

    println!("File:        {}", args.file.display());
    println!("Title:       {}", parsed.display_title());
    println!("Pages:       {}", metadata.page_count);
    if let Some(author) = &metadata.author {
        println!("Author:      {}", author);
    }
    if let Some(subject) = &metadata.subject {
        println!("Subject:     {}", subject);
    }
    if let Some(created) = &metadata.creation_date {
        println!("Created:     {}", created.to_rfc3339());
    }
    println!("Characters:  {}", parsed.text.chars().count());

    let recursive = RecursiveCharacterTextSplitter::new(args.chunk_size, args.chunk_overlap)
        .split_text(&parsed.text);
    println!("Fixed chunks:     {}", parsed.chunks.len());
    println!("Recursive chunks: {}", recursive.len());

    if !parsed.has_text() {
        println!("\nNo extractable text; the document cannot be used for chat.");
    }

    if args.pages {
        println!();
        for page in &parsed.pages {
            println!("  page {:>4}: {} chars", page.page_number, page.text.chars().count());
        }
    }
    Ok(())
}

fn config_error(err: ConfigError) -> anyhow::Error {
    anyhow!("{}", err)
}

/// Build a one-off session for a local PDF and answer a question
pub async fn ask(args: AskArgs) -> Result<()> {
    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();

    let mut missing = Vec::new();
    let openai = OpenAiConfig::from_env(&mut missing);
    if !missing.is_empty() {
        return Err(config_error(ConfigError::MissingVariables(missing)));
    }
    openai.validate().map_err(config_error)?;

    let mut rag = RagConfig::from_env().map_err(config_error)?;
    if let Some(top_k) = args.top_k {
        rag.top_k = top_k;
    }
    rag.validate().map_err(config_error)?;

    let parsed = read_pdf(&args.file, rag.chunk_size)?;
    let client = Arc::new(OpenAiClient::new(openai)?);
    let pipeline = RagPipeline::new(client.clone(), client, rag);

    info!("Embedding {}", args.file.display());
    let mut session = pipeline.create_session("cli", &parsed).await?;
    let answer = session.ask(&args.question, args.level).await?;

    println!("{}\n", answer.answer);
    if !answer.source_documents.is_empty() {
        println!("Sources:");
        for source in &answer.source_documents {
            let page = source.document.metadata["pageNumber"]
                .as_u64()
                .map(|p| format!("page {}", p))
                .unwrap_or_else(|| "page ?".to_string());
            println!("  {} (score {:.3})", page, source.score);
        }
    }
    Ok(())
}
