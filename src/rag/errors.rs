// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the retrieval pipeline
//!
//! Covers vector store validation, embedding/completion failures surfaced by
//! the chain, and session lifecycle errors.

use thiserror::Error;

use crate::llm::LlmError;

/// Errors raised while building or querying a chat session
#[derive(Error, Debug)]
pub enum RagError {
    /// Vector rejected by the store (empty, non-finite, metadata too large)
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Vector dimension does not match the store
    #[error("Dimension mismatch: expected {expected}D, got {actual}D")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Store is full
    #[error("Vector store capacity exceeded (max: {max} vectors)")]
    CapacityExceeded { max: usize },

    /// Embedding provider returned a different number of vectors
    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    /// Document has no extractable text
    #[error("Document contains no extractable text")]
    EmptyDocument,

    /// Question was empty after trimming
    #[error("Question cannot be empty")]
    EmptyQuestion,

    /// Session used before `initialize`
    #[error("Chat session is not initialized")]
    NotInitialized,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Client-supplied session id is empty, too long or has odd characters
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    /// Session exists but belongs to a different user
    #[error("Session {0} belongs to another user")]
    SessionOwnerMismatch(String),

    #[error("Maximum sessions limit reached ({max})")]
    SessionLimitReached { max: usize },

    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl RagError {
    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            RagError::InvalidVector(_) => "INVALID_VECTOR",
            RagError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            RagError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            RagError::EmbeddingCountMismatch { .. } => "EMBEDDING_COUNT_MISMATCH",
            RagError::EmptyDocument => "EMPTY_DOCUMENT",
            RagError::EmptyQuestion => "EMPTY_QUESTION",
            RagError::NotInitialized => "NOT_INITIALIZED",
            RagError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            RagError::InvalidSessionId(_) => "INVALID_SESSION_ID",
            RagError::SessionOwnerMismatch(_) => "SESSION_OWNER_MISMATCH",
            RagError::SessionLimitReached { .. } => "SESSION_LIMIT_REACHED",
            RagError::Llm(_) => "LLM_ERROR",
        }
    }

    /// Check if the caller could succeed by retrying later
    pub fn is_retryable(&self) -> bool {
        match self {
            RagError::Llm(err) => err.is_retryable(),
            RagError::SessionLimitReached { .. } => true,
            _ => false,
        }
    }
}
