// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Rows and auth payloads exchanged with Supabase

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Row of the `pdf_documents` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfDocument {
    /// Primary key; bigint or uuid depending on the schema
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub user_id: String,
    /// Storage object name, `{uuid}-{original name}`
    pub file_id: String,
    pub file_name: String,
    pub storage_path: String,
    pub title: String,
    pub page_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Values inserted for a new upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPdfDocument {
    pub user_id: String,
    pub file_id: String,
    pub file_name: String,
    pub storage_path: String,
    pub title: String,
    pub page_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Tokens returned by a code exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
    pub user: AuthUser,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
