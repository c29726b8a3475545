// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::auth::AuthenticatedUser;
use super::{ApiError, AppState};

/// Longest lifetime a client may request for a signed URL (7 days)
const MAX_EXPIRES_IN: u64 = 7 * 24 * 60 * 60;

/// Request body for POST /api/storage/get-signed-url
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlRequest {
    #[serde(default)]
    pub path: Option<String>,

    /// Must name the configured upload bucket
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Lifetime in seconds
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_bucket() -> String {
    "pdfs".to_string()
}

fn default_expires_in() -> u64 {
    3600
}

impl SignedUrlRequest {
    pub fn validate(&self, bucket: &str) -> Result<&str, ApiError> {
        let path = self
            .path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::InvalidRequest("Path is required".to_string()))?;
        if self.bucket != bucket {
            return Err(ApiError::ValidationError {
                field: "bucket".to_string(),
                message: format!("Unknown bucket '{}'", self.bucket),
            });
        }
        if self.expires_in == 0 || self.expires_in > MAX_EXPIRES_IN {
            return Err(ApiError::ValidationError {
                field: "expiresIn".to_string(),
                message: format!("expiresIn must be between 1 and {}", MAX_EXPIRES_IN),
            });
        }
        Ok(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlResponse {
    pub signed_url: String,
}

/// POST /api/storage/get-signed-url - time-limited link to one of the
/// caller's PDFs
pub async fn signed_url_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<SignedUrlRequest>,
) -> Result<Json<SignedUrlResponse>, ApiError> {
    let path = request.validate(state.bucket())?;

    let owned = state
        .documents
        .find_by_file_id(path, user.id())
        .await
        .map_err(|e| {
            error!("Failed to look up file {}: {}", path, e);
            ApiError::InternalError("Failed to create signed URL".to_string())
        })?;
    if owned.is_none() {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    let signed_url = state
        .storage
        .create_signed_url(&request.bucket, path, request.expires_in)
        .await
        .map_err(|e| {
            error!("Failed to sign {}/{}: {}", request.bucket, path, e);
            ApiError::InternalError("Failed to create signed URL".to_string())
        })?;
    debug!("Signed {} for {}s", path, request.expires_in);

    Ok(Json(SignedUrlResponse { signed_url }))
}
