// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PDF text and metadata extraction
//!
//! Parsing is CPU bound; async callers should run it on the blocking pool
//! (see [`parse_pdf_blocking`]).

pub mod parser;
pub mod validation;

pub use parser::{extract_page_text, parse_pdf, PageText, ParsedPdf, PdfMetadata};
pub use validation::validate_pdf_upload;

use bytes::Bytes;
use thiserror::Error;

/// Errors raised while validating or parsing a PDF
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Invalid content type: expected {expected}, got {actual}")]
    InvalidContentType { expected: String, actual: String },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("File is empty")]
    Empty,

    #[error("File is not a PDF document")]
    NotAPdf,

    #[error("Failed to parse PDF file: {0}")]
    Parse(String),

    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("PDF parsing task failed: {0}")]
    Task(String),
}

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        PdfError::Parse(err.to_string())
    }
}

impl PdfError {
    /// Whether the error was caused by the uploaded bytes rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PdfError::Task(_))
    }
}

/// Run [`parse_pdf`] on tokio's blocking pool
pub async fn parse_pdf_blocking(bytes: Bytes, chunk_size: usize) -> Result<ParsedPdf, PdfError> {
    tokio::task::spawn_blocking(move || parse_pdf(&bytes, chunk_size))
        .await
        .map_err(|e| PdfError::Task(e.to_string()))?
}
