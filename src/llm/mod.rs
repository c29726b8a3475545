// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hosted model access: embeddings and chat completions
//!
//! The retrieval chain only sees the [`EmbeddingProvider`] and [`ChatModel`]
//! traits; [`OpenAiClient`] talks to the OpenAI HTTP API and the types in
//! [`mock`] give deterministic behaviour for tests and offline runs.

pub mod mock;
pub mod openai;
pub mod provider;

pub use mock::{HashingEmbeddings, ScriptedChatModel};
pub use openai::OpenAiClient;
pub use provider::{ChatMessage, ChatModel, EmbeddingProvider, Role};

use thiserror::Error;

/// Errors returned by model providers
#[derive(Debug, Error)]
pub enum LlmError {
    /// API key rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Provider rate limit hit after all retries
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Connection-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether the request may succeed if sent again
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited(_) | LlmError::Timeout { .. } | LlmError::Http(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::Unauthorized(_) | LlmError::InvalidResponse(_) => false,
        }
    }
}
