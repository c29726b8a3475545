// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Listing and deleting a user's documents

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::auth::AuthenticatedUser;
use super::{ApiError, AppState};
use crate::supabase::PdfDocument;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsResponse {
    pub documents: Vec<PdfDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteDocumentQuery {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDocumentResponse {
    pub success: bool,
    pub message: String,
}

/// GET /api/pdfs - documents of the caller, newest first
pub async fn list_documents_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<DocumentsResponse>, ApiError> {
    let documents = state
        .documents
        .list_for_user(user.id())
        .await
        .map_err(|e| {
            error!("Failed to list documents for {}: {}", user.id(), e);
            ApiError::InternalError("Failed to fetch documents".to_string())
        })?;
    Ok(Json(DocumentsResponse { documents }))
}

/// DELETE /api/pdfs?id= (also mounted at /api/pdfs/delete)
///
/// Removes the metadata row, the stored object, stored chat messages and any
/// live chat sessions built from the document. Only the row deletion is
/// fatal; the other steps are logged when they fail.
pub async fn delete_document_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<DeleteDocumentQuery>,
) -> Result<Json<DeleteDocumentResponse>, ApiError> {
    let id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("Document ID is required".to_string()))?;

    let document = state
        .documents
        .find_for_user(id, user.id())
        .await
        .map_err(|e| {
            error!("Failed to look up document {}: {}", id, e);
            ApiError::InternalError("Failed to delete document".to_string())
        })?
        .ok_or_else(|| {
            ApiError::NotFound(
                "Document not found or you do not have permission to delete it".to_string(),
            )
        })?;

    if let Err(e) = state.documents.delete_chat_messages(&document.id).await {
        warn!("Failed to delete chat messages of document {}: {}", document.id, e);
    }

    state
        .documents
        .delete(&document.id, user.id())
        .await
        .map_err(|e| {
            error!("Failed to delete document {}: {}", document.id, e);
            ApiError::InternalError("Failed to delete document".to_string())
        })?;

    if let Err(e) = state
        .storage
        .remove(state.bucket(), &[document.storage_path.clone()])
        .await
    {
        warn!("Failed to remove stored file {}: {}", document.storage_path, e);
    }

    let dropped = state
        .sessions
        .remove_for_file(user.id(), &document.file_id)
        .await;
    info!(
        "Deleted document {} for user {} ({} chat sessions dropped)",
        document.id,
        user.id(),
        dropped
    );

    Ok(Json(DeleteDocumentResponse {
        success: true,
        message: "Document and associated data deleted successfully".to_string(),
    }))
}
