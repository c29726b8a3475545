// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Response bodies of the chat endpoints

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rag::{source_metadata, ChatAnswer, HistoryEntry, LocatedText, ScoredDocument};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
    pub page_count: u32,
    pub title: String,
}

/// Response of the legacy multipart initialisation (PUT /api/chat)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyInitResponse {
    pub success: bool,
    pub session_id: String,
    pub page_count: u32,
    pub title: String,
}

/// A retrieved chunk returned with an answer
///
/// `metadata` carries `chunkIndex`, `score` and, when the chunk could be
/// placed, `pageNumber`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub page_content: String,
    pub metadata: Value,
}

impl From<&ScoredDocument> for SourceDocument {
    fn from(scored: &ScoredDocument) -> Self {
        Self {
            page_content: scored.document.page_content.clone(),
            metadata: source_metadata(scored),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub answer: String,
    pub source_documents: Vec<SourceDocument>,
}

impl From<ChatAnswer> for AskResponse {
    fn from(answer: ChatAnswer) -> Self {
        Self {
            source_documents: answer.source_documents.iter().map(SourceDocument::from).collect(),
            answer: answer.answer,
        }
    }
}

/// Response of the legacy POST /api/chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyAskResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearSessionResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Byte offsets into the page text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl From<Option<LocatedText>> for LocateResponse {
    fn from(located: Option<LocatedText>) -> Self {
        match located {
            Some(located) => Self {
                found: true,
                page_number: Some(located.page_number),
                start: located.span.map(|s| s.start),
                end: located.span.map(|s| s.end),
                strategy: Some(located.strategy.to_string()),
            },
            None => Self::default(),
        }
    }
}
