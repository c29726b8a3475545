// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{error, warn};

use crate::llm::LlmError;
use crate::pdf::PdfError;
use crate::rag::RagError;
use crate::supabase::SupabaseError;

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound(String),
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    Unauthorized(String),
    Forbidden(String),
    UnprocessableEntity(String),
    RateLimitExceeded {
        retry_after: u64,
    },
    ServiceUnavailable(String),
    /// Upstream model provider failed
    BadGateway(String),
    InternalError(String),
    Timeout,
}

impl ApiError {
    pub fn authentication_required() -> Self {
        ApiError::Unauthorized("Authentication required".to_string())
    }

    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg.clone(), None),
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::Unauthorized(msg) => ("unauthorized", msg.clone(), None),
            ApiError::Forbidden(msg) => ("forbidden", msg.clone(), None),
            ApiError::UnprocessableEntity(msg) => ("unprocessable_entity", msg.clone(), None),
            ApiError::RateLimitExceeded { retry_after } => {
                let mut details = HashMap::new();
                details.insert(
                    "retryAfter".to_string(),
                    serde_json::Value::Number((*retry_after).into()),
                );
                (
                    "rate_limit_exceeded",
                    "Too many questions, please slow down".to_string(),
                    Some(details),
                )
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone(), None),
            ApiError::BadGateway(msg) => ("upstream_error", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
            ApiError::Timeout => ("timeout", "Request timed out".to_string(), None),
        };

        ErrorResponse {
            error: message,
            error_type: error_type.to_string(),
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::UnprocessableEntity(_) => 422,
            ApiError::RateLimitExceeded { .. } => 429,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::BadGateway(_) => 502,
            ApiError::InternalError(_) => 500,
            ApiError::Timeout => 504,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::UnprocessableEntity(msg) => write!(f, "Unprocessable: {}", msg),
            ApiError::RateLimitExceeded { retry_after } => write!(
                f,
                "Rate limit exceeded, retry after {} seconds",
                retry_after
            ),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(self.to_response(None))).into_response()
    }
}

impl From<PdfError> for ApiError {
    fn from(err: PdfError) -> Self {
        if err.is_client_error() {
            ApiError::InvalidRequest(err.to_string())
        } else {
            ApiError::InternalError(err.to_string())
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout { .. } => ApiError::Timeout,
            LlmError::RateLimited(_) => {
                ApiError::ServiceUnavailable("The language model is busy, try again shortly".to_string())
            }
            other => ApiError::BadGateway(other.to_string()),
        }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::SessionNotFound(_) => ApiError::NotFound("Chat session not found".to_string()),
            RagError::SessionOwnerMismatch(_) => {
                ApiError::Forbidden("Chat session belongs to another user".to_string())
            }
            RagError::InvalidSessionId(reason) => ApiError::ValidationError {
                field: "sessionId".to_string(),
                message: format!("Invalid session id: {}", reason),
            },
            RagError::EmptyQuestion => ApiError::ValidationError {
                field: "message".to_string(),
                message: err.to_string(),
            },
            RagError::EmptyDocument => ApiError::UnprocessableEntity(err.to_string()),
            RagError::NotInitialized => ApiError::InvalidRequest(err.to_string()),
            RagError::SessionLimitReached { .. } => ApiError::ServiceUnavailable(err.to_string()),
            RagError::Llm(inner) => inner.into(),
            other => {
                warn!("Retrieval failure [{}]: {}", other.error_code(), other);
                ApiError::InternalError(other.to_string())
            }
        }
    }
}

impl From<SupabaseError> for ApiError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Unauthorized(_) => ApiError::authentication_required(),
            SupabaseError::NotFound(msg) => ApiError::NotFound(msg),
            SupabaseError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}
