// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! POST /api/upload

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{error, info, warn};

use super::auth::AuthenticatedUser;
use super::{ApiError, AppState};
use crate::pdf::{parse_pdf_blocking, validate_pdf_upload, ParsedPdf};
use crate::supabase::NewPdfDocument;

/// The `file` part of a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A multipart form carrying one PDF plus text fields
#[derive(Debug, Clone, Default)]
pub struct PdfForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl PdfForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = PdfForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("document.pdf").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::InvalidRequest(format!("Failed to read uploaded file: {}", e))
                })?;
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            } else if !name.is_empty() {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid field {}: {}", name, e)))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    pub fn require_file(self) -> Result<(UploadedFile, HashMap<String, String>), ApiError> {
        match self.file {
            Some(file) => Ok((file, self.fields)),
            None => Err(ApiError::InvalidRequest("No file uploaded".to_string())),
        }
    }
}

/// Validate and parse an uploaded PDF on the blocking pool
pub async fn parse_upload(state: &AppState, file: &UploadedFile) -> Result<ParsedPdf, ApiError> {
    validate_pdf_upload(file.content_type.as_deref(), &file.bytes, &state.config.upload)?;
    Ok(parse_pdf_blocking(file.bytes.clone(), state.config.rag.chunk_size).await?)
}

/// Storage object name: `{uuid}-{name}` with path separators replaced
pub fn storage_file_id(file_name: &str) -> String {
    let name: String = file_name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    let name = if name.is_empty() { "document.pdf".to_string() } else { name };
    format!("{}-{}", uuid::Uuid::new_v4(), name)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub page_count: u32,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_id: String,
    pub public_url: String,
    pub metadata: UploadMetadata,
}

/// POST /api/upload - multipart `file`
///
/// # Errors
/// - 400: no file, document limit reached, not a valid PDF
/// - 500: storage upload or metadata insert failed (the stored object is
///   removed again when the insert fails)
pub async fn upload_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let (file, _) = PdfForm::read(multipart).await?.require_file()?;

    let max_documents = state.config.upload.max_documents;
    let existing = state
        .documents
        .count_for_user(user.id())
        .await
        .map_err(|e| {
            error!("Failed to count documents for {}: {}", user.id(), e);
            ApiError::InternalError("Failed to check document limit".to_string())
        })?;
    if existing >= max_documents {
        return Err(ApiError::InvalidRequest(format!(
            "Maximum of {} PDFs allowed. Please delete one to upload a new one.",
            max_documents
        )));
    }

    let parsed = parse_upload(&state, &file).await?;
    let title = parsed.display_title();
    let page_count = parsed.metadata.page_count;

    let file_id = storage_file_id(&file.file_name);
    let bucket = state.bucket();
    state
        .storage
        .upload(bucket, &file_id, file.bytes.clone(), "application/pdf")
        .await
        .map_err(|e| {
            error!("Failed to store {}: {}", file_id, e);
            ApiError::InternalError("Failed to upload file".to_string())
        })?;

    let inserted = state
        .documents
        .insert(NewPdfDocument {
            user_id: user.id().to_string(),
            file_id: file_id.clone(),
            file_name: file.file_name.clone(),
            storage_path: file_id.clone(),
            title: title.clone(),
            page_count,
        })
        .await;
    if let Err(e) = inserted {
        error!("Failed to save metadata for {}: {}", file_id, e);
        if let Err(e) = state.storage.remove(bucket, &[file_id.clone()]).await {
            warn!("Failed to remove orphaned upload {}: {}", file_id, e);
        }
        return Err(ApiError::InternalError(
            "Failed to save PDF metadata".to_string(),
        ));
    }

    info!(
        "User {} uploaded {} ({} pages, {} bytes)",
        user.id(),
        file_id,
        page_count,
        file.bytes.len()
    );

    Ok(Json(UploadResponse {
        success: true,
        public_url: state.storage.public_url(bucket, &file_id),
        file_id,
        metadata: UploadMetadata { page_count, title },
    }))
}
