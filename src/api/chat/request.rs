// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request bodies of the chat endpoints

use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::rag::ExplanationLevel;

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Request body for POST /api/chat/init
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitRequest {
    /// Storage object name returned by the upload endpoint
    #[serde(default)]
    pub file_id: Option<String>,

    /// Client-chosen session id; generated when absent
    #[serde(default)]
    pub session_id: Option<String>,
}

impl InitRequest {
    pub fn file_id(&self) -> Result<&str, ApiError> {
        required(&self.file_id)
            .ok_or_else(|| ApiError::InvalidRequest("File ID is required".to_string()))
    }

    pub fn session_id(&self) -> Option<&str> {
        required(&self.session_id)
    }
}

/// Request body for POST /api/chat/ask and the legacy POST /api/chat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub session_id: Option<String>,

    /// When given, must match the document the session was built from
    #[serde(default)]
    pub file_id: Option<String>,

    /// Audience label such as "High Schooler"
    #[serde(default)]
    pub level: Option<String>,
}

/// Checked form of an [`AskRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct Question<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
    pub file_id: Option<&'a str>,
    pub level: Option<ExplanationLevel>,
}

impl AskRequest {
    pub fn validate(&self) -> Result<Question<'_>, ApiError> {
        let (message, session_id) = match (required(&self.message), required(&self.session_id)) {
            (Some(message), Some(session_id)) => (message, session_id),
            _ => {
                return Err(ApiError::InvalidRequest(
                    "Missing required fields: message and sessionId".to_string(),
                ))
            }
        };

        let level = match required(&self.level) {
            Some(label) => Some(label.parse::<ExplanationLevel>().map_err(|message| {
                ApiError::ValidationError {
                    field: "level".to_string(),
                    message,
                }
            })?),
            None => None,
        };

        Ok(Question {
            message,
            session_id,
            file_id: required(&self.file_id),
            level,
        })
    }
}

/// Query string of the session endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

impl SessionQuery {
    pub fn session_id(&self) -> Result<&str, ApiError> {
        required(&self.session_id)
            .ok_or_else(|| ApiError::InvalidRequest("Session ID is required".to_string()))
    }
}

/// Request body for POST /api/chat/locate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateRequest {
    #[serde(default)]
    pub session_id: Option<String>,

    /// Source text to find in the document
    #[serde(default)]
    pub text: Option<String>,
}

impl LocateRequest {
    pub fn validate(&self) -> Result<(&str, &str), ApiError> {
        let session_id = required(&self.session_id)
            .ok_or_else(|| ApiError::InvalidRequest("Session ID is required".to_string()))?;
        let text = required(&self.text)
            .ok_or_else(|| ApiError::InvalidRequest("Text is required".to_string()))?;
        Ok((session_id, text))
    }
}
