// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use thiserror::Error;

/// Errors returned by the Supabase auth, storage and database clients
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Token missing, expired or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Supabase API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Connection-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SupabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SupabaseError::NotFound(_))
    }

    /// Map a non-success HTTP status and body to an error
    pub fn from_status(status: u16, body: String) -> Self {
        let message = api_message(&body).unwrap_or(body);
        match status {
            401 | 403 => SupabaseError::Unauthorized(message),
            404 => SupabaseError::NotFound(message),
            // Storage reports missing objects as 400 with a "not found" message
            400 if message.to_lowercase().contains("not found") => SupabaseError::NotFound(message),
            _ => SupabaseError::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for SupabaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SupabaseError::InvalidResponse(err.to_string())
        } else {
            SupabaseError::Http(err.to_string())
        }
    }
}

/// Pull a human readable message out of a Supabase error body
fn api_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value[*key].as_str())
        .map(str::to_string)
}
