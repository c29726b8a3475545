// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieval pipeline and upload limits

use std::env;
use std::time::Duration;

use super::{env_parse, ConfigError};
use crate::rag::text_splitter::ChunkingStrategy;

/// Settings for chunking, retrieval and in-memory chat sessions
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Characters per chunk
    pub chunk_size: usize,
    /// Characters carried over between recursive chunks
    pub chunk_overlap: usize,
    pub chunking: ChunkingStrategy,
    /// Chunks retrieved per question
    pub top_k: usize,
    pub max_sessions: usize,
    pub session_idle_timeout: Duration,
    /// Questions per user per minute
    pub ask_rate_per_minute: u32,
    /// Upper bound on chunks held by one session store
    pub max_chunks_per_session: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            chunking: ChunkingStrategy::Recursive,
            top_k: 4,
            max_sessions: 1000,
            session_idle_timeout: Duration::from_secs(7200),
            ask_rate_per_minute: 30,
            max_chunks_per_session: 20_000,
        }
    }
}

impl RagConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let chunking = match env::var("RAG_CHUNKING") {
            Ok(value) => value.parse().map_err(|reason| ConfigError::InvalidValue {
                name: "RAG_CHUNKING".to_string(),
                reason,
            })?,
            Err(_) => defaults.chunking,
        };

        Ok(Self {
            chunk_size: env_parse("RAG_CHUNK_SIZE").unwrap_or(defaults.chunk_size),
            chunk_overlap: env_parse("RAG_CHUNK_OVERLAP").unwrap_or(defaults.chunk_overlap),
            chunking,
            top_k: env_parse("RAG_TOP_K").unwrap_or(defaults.top_k),
            max_sessions: env_parse("RAG_MAX_SESSIONS").unwrap_or(defaults.max_sessions),
            session_idle_timeout: env_parse("RAG_SESSION_IDLE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle_timeout),
            ask_rate_per_minute: env_parse("RAG_ASK_RATE_PER_MINUTE")
                .unwrap_or(defaults.ask_rate_per_minute),
            max_chunks_per_session: env_parse("RAG_MAX_CHUNKS_PER_SESSION")
                .unwrap_or(defaults.max_chunks_per_session),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(invalid("RAG_CHUNK_SIZE", "must be greater than 0"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(invalid(
                "RAG_CHUNK_OVERLAP",
                &format!(
                    "overlap {} must be smaller than chunk size {}",
                    self.chunk_overlap, self.chunk_size
                ),
            ));
        }
        if self.top_k == 0 {
            return Err(invalid("RAG_TOP_K", "must be greater than 0"));
        }
        if self.max_sessions == 0 {
            return Err(invalid("RAG_MAX_SESSIONS", "must be greater than 0"));
        }
        if self.ask_rate_per_minute == 0 {
            return Err(invalid("RAG_ASK_RATE_PER_MINUTE", "must be greater than 0"));
        }
        if self.session_idle_timeout.is_zero() {
            return Err(invalid("RAG_SESSION_IDLE_SECS", "must be greater than 0"));
        }
        Ok(())
    }
}

/// Limits applied to uploaded PDFs
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_bytes: usize,
    /// Documents a single user may keep
    pub max_documents: usize,
    pub accepted_content_type: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            max_documents: 5,
            accepted_content_type: "application/pdf".to_string(),
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_bytes: env_parse("UPLOAD_MAX_BYTES").unwrap_or(defaults.max_bytes),
            max_documents: env_parse("UPLOAD_MAX_DOCUMENTS").unwrap_or(defaults.max_documents),
            accepted_content_type: defaults.accepted_content_type,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("UPLOAD_MAX_BYTES", "must be greater than 0"));
        }
        if self.max_documents == 0 {
            return Err(invalid("UPLOAD_MAX_DOCUMENTS", "must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
