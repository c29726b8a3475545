// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Parser;
use pdfmate::{
    api::{start_server, AppState},
    config::AppConfig,
    llm::OpenAiClient,
    supabase::{PostgrestRepository, SupabaseAuth, SupabaseStorage},
    version,
};
use std::{env, path::PathBuf, sync::Arc, time::Duration};
use tokio::signal;
use tracing::{error, info};

/// PDFmate API server
#[derive(Parser, Debug)]
#[command(name = "pdfmate")]
#[command(version)]
#[command(about = "Upload PDFs and chat with them", long_about = None)]
struct Args {
    /// Address to bind, e.g. 0.0.0.0:8080
    #[arg(long, env = "PDFMATE_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Prebuilt frontend bundle to serve
    #[arg(long, env = "PDFMATE_STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    info!("Starting {}", version::get_version_string());
    info!("Build version: {}", version::VERSION);

    let mut config = AppConfig::from_env().map_err(|e| anyhow!("{}", e))?;
    if let Some(listen_addr) = args.listen_addr {
        config.server.listen_addr = listen_addr;
    }
    if let Some(static_dir) = args.static_dir {
        config.server.static_dir = Some(static_dir);
    }
    config.validate().map_err(|e| anyhow!("{}", e))?;

    info!(
        "Models: chat={} embeddings={}",
        config.openai.chat_model, config.openai.embedding_model
    );
    if config.supabase.jwt_secret.is_some() {
        info!("Verifying access tokens locally");
    } else {
        info!("Verifying access tokens against Supabase Auth");
    }

    let openai = Arc::new(OpenAiClient::new(config.openai.clone())?);
    let auth = Arc::new(SupabaseAuth::new(config.supabase.clone())?);
    let storage = Arc::new(SupabaseStorage::new(&config.supabase)?);
    let documents = Arc::new(PostgrestRepository::new(&config.supabase)?);

    let cleanup_interval = Duration::from_secs(config.server.session_cleanup_interval_secs);
    let state = AppState::new(config, auth, storage, documents, openai.clone(), openai);

    let cleanup = state.sessions.clone().spawn_cleanup_task(cleanup_interval);
    let limiter = state.ask_limiter.clone();
    let limiter_cleanup = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cleanup_interval);
        loop {
            ticker.tick().await;
            limiter.shrink();
        }
    });

    let result = start_server(state, shutdown_signal()).await;

    cleanup.abort();
    limiter_cleanup.abort();
    result.map_err(|e| anyhow!("Server error: {}", e))?;

    info!("PDFmate stopped");
    Ok(())
}
