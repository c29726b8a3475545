// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat session HTTP handlers

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::Multipart;
use bytes::Bytes;
use tracing::{info, warn};

use super::request::{AskRequest, InitRequest, LocateRequest, SessionQuery};
use super::response::{
    AskResponse, ClearSessionResponse, HistoryResponse, InitResponse, LegacyAskResponse,
    LegacyInitResponse, LocateResponse,
};
use crate::api::auth::AuthenticatedUser;
use crate::api::upload::{parse_upload, PdfForm};
use crate::api::{ApiError, AppState};
use crate::pdf::parse_pdf_blocking;
use crate::rag::ChatAnswer;
use crate::supabase::PdfDocument;

/// Lifetime of the signed URL used when a direct download fails
const FALLBACK_SIGNED_URL_SECS: u64 = 60;

/// Bytes of a stored document: direct download first, then a short-lived
/// signed URL
async fn fetch_document(state: &AppState, document: &PdfDocument) -> Result<Bytes, ApiError> {
    let bucket = state.bucket();
    let path = &document.storage_path;
    let direct_err = match state.storage.download(bucket, path).await {
        Ok(bytes) => return Ok(bytes),
        Err(e) => e,
    };
    warn!(
        "Direct download of {} failed ({}), trying a signed URL",
        path, direct_err
    );

    let fallback = async {
        let url = state
            .storage
            .create_signed_url(bucket, path, FALLBACK_SIGNED_URL_SECS)
            .await?;
        state.storage.fetch(&url).await
    };
    fallback.await.map_err(|e| {
        warn!("Signed URL download of {} failed: {}", path, e);
        ApiError::NotFound("PDF file not found".to_string())
    })
}

/// POST /api/chat/init - build a chat session for an uploaded document
pub async fn init_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<InitRequest>,
) -> Result<Json<InitResponse>, ApiError> {
    let file_id = request.file_id()?;

    let document = state
        .documents
        .find_by_file_id(file_id, user.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let bytes = fetch_document(&state, &document).await?;
    let parsed = parse_pdf_blocking(bytes, state.config.rag.chunk_size).await?;

    let session_id = state
        .sessions
        .create(
            request.session_id(),
            user.id(),
            Some(file_id),
            &parsed,
            &state.pipeline,
        )
        .await?;
    info!(
        "Chat session {} initialized for {} ({} pages)",
        session_id, file_id, parsed.metadata.page_count
    );

    Ok(Json(InitResponse {
        success: true,
        message: "Chat session initialized successfully".to_string(),
        session_id,
        page_count: parsed.metadata.page_count,
        title: parsed.display_title(),
    }))
}

async fn answer_question(
    state: &AppState,
    user: &AuthenticatedUser,
    request: &AskRequest,
) -> Result<ChatAnswer, ApiError> {
    let question = request.validate()?;
    state.ask_limiter.check(user.id())?;

    let entry = state.sessions.get(question.session_id, user.id()).await?;
    if let Some(file_id) = question.file_id {
        if entry.file_id().is_some_and(|f| f != file_id) {
            return Err(ApiError::InvalidRequest(
                "Session was initialized for a different document".to_string(),
            ));
        }
    }

    let mut session = entry.lock().await;
    let answer = session.ask(question.message, question.level).await?;
    Ok(answer)
}

/// POST /api/chat/ask - answer a question with its source chunks
pub async fn ask_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let answer = answer_question(&state, &user, &request).await?;
    Ok(Json(AskResponse::from(answer)))
}

/// POST /api/chat - answer only
pub async fn legacy_ask_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<AskRequest>,
) -> Result<Json<LegacyAskResponse>, ApiError> {
    let answer = answer_question(&state, &user, &request).await?;
    Ok(Json(LegacyAskResponse {
        answer: answer.answer,
    }))
}

/// PUT /api/chat - multipart `file` and optional `sessionId`; builds a
/// session directly from the uploaded bytes without storing them
pub async fn legacy_init_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<Json<LegacyInitResponse>, ApiError> {
    let (file, fields) = PdfForm::read(multipart).await?.require_file()?;
    let parsed = parse_upload(&state, &file).await?;

    let session_id = state
        .sessions
        .create(
            fields.get("sessionId").map(String::as_str),
            user.id(),
            None,
            &parsed,
            &state.pipeline,
        )
        .await?;
    info!("Chat session {} initialized from {}", session_id, file.file_name);

    Ok(Json(LegacyInitResponse {
        success: true,
        session_id,
        page_count: parsed.metadata.page_count,
        title: parsed.display_title(),
    }))
}

/// DELETE /api/chat?sessionId=
pub async fn clear_session_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<SessionQuery>,
) -> Result<Json<ClearSessionResponse>, ApiError> {
    let session_id = query.session_id()?;
    state.sessions.remove(session_id, user.id()).await?;
    Ok(Json(ClearSessionResponse { success: true }))
}

/// GET /api/chat/history?sessionId= - empty for unknown sessions
pub async fn history_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<SessionQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session_id = query.session_id()?;
    let history = state.sessions.history(session_id, user.id()).await?;
    Ok(Json(HistoryResponse { history }))
}

/// POST /api/chat/locate - page and span of a source text
pub async fn locate_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<LocateRequest>,
) -> Result<Json<LocateResponse>, ApiError> {
    let (session_id, text) = request.validate()?;
    let entry = state.sessions.get(session_id, user.id()).await?;
    let located = entry.lock().await.locate(text);
    Ok(Json(LocateResponse::from(located)))
}
