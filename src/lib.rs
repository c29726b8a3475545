// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod llm;
pub mod pdf;
pub mod rag;
pub mod supabase;
pub mod version;

pub use api::{create_app, AppState};
pub use config::AppConfig;
pub use pdf::{parse_pdf, ParsedPdf};
pub use rag::{ChatSessionStore, PdfChatSession, RagPipeline};
