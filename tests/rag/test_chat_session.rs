// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/rag/test_chat_session.rs

use crate::common::{build_pdf, sample_pdf};
use pdfmate::config::RagConfig;
use pdfmate::llm::{HashingEmbeddings, Role, ScriptedChatModel};
use pdfmate::pdf::parse_pdf;
use pdfmate::rag::{ChunkingStrategy, ExplanationLevel, RagError, RagPipeline};
use std::sync::Arc;

fn pipeline(model: Arc<ScriptedChatModel>, config: RagConfig) -> RagPipeline {
    RagPipeline::new(Arc::new(HashingEmbeddings::new(256)), model, config)
}

fn small_chunks() -> RagConfig {
    RagConfig {
        chunk_size: 80,
        chunk_overlap: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_session_from_parsed_pdf() {
    let parsed = parse_pdf(&sample_pdf(), 1000).unwrap();
    let model = Arc::new(ScriptedChatModel::constant("Twelve percent."));
    let mut session = pipeline(model.clone(), small_chunks())
        .create_session("s1", &parsed)
        .await
        .unwrap();

    assert!(session.is_initialized());
    assert_eq!(session.title(), "Quarterly Report");
    assert_eq!(session.page_count(), 2);
    assert!(session.chunk_count() >= 2);

    let answer = session
        .ask("How much did revenue grow in the third quarter?", None)
        .await
        .unwrap();
    assert_eq!(answer.answer, "Twelve percent.");
    let top = &answer.source_documents[0];
    assert!(top.document.page_content.contains("Revenue"));
    assert_eq!(top.document.metadata["pageNumber"], 1);
}

#[tokio::test]
async fn test_refine_runs_once_per_retrieved_chunk() {
    let parsed = parse_pdf(&sample_pdf(), 1000).unwrap();
    let model = Arc::new(ScriptedChatModel::constant("answer"));
    let config = RagConfig {
        top_k: 2,
        ..small_chunks()
    };
    let mut session = pipeline(model.clone(), config)
        .create_session("s1", &parsed)
        .await
        .unwrap();

    let answer = session.ask("What happened to costs?", None).await.unwrap();
    assert_eq!(answer.source_documents.len(), 2);

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0][0].content.contains("Context information is below."));
    assert!(calls[1][0].content.contains("We have provided an existing answer: answer"));
}

#[tokio::test]
async fn test_explanation_level_adds_system_instruction() {
    let parsed = parse_pdf(&sample_pdf(), 1000).unwrap();
    let model = Arc::new(ScriptedChatModel::constant("Money went up."));
    let config = RagConfig {
        top_k: 1,
        ..small_chunks()
    };
    let mut session = pipeline(model.clone(), config)
        .create_session("s1", &parsed)
        .await
        .unwrap();

    session
        .ask("Did revenue grow?", Some(ExplanationLevel::FiveYearOld))
        .await
        .unwrap();

    let calls = model.calls();
    assert_eq!(calls[0][0].role, Role::System);
    assert!(calls[0][0].content.contains("five year old"));
    assert_eq!(calls[0][1].role, Role::User);
}

#[tokio::test]
async fn test_fixed_chunking_uses_parser_chunks() {
    let parsed = parse_pdf(&sample_pdf(), 50).unwrap();
    let config = RagConfig {
        chunking: ChunkingStrategy::Fixed,
        chunk_size: 50,
        chunk_overlap: 0,
        ..Default::default()
    };
    let model = Arc::new(ScriptedChatModel::constant("ok"));
    let pipeline = pipeline(model, config);

    assert_eq!(pipeline.chunk(&parsed), parsed.chunks);
    let session = pipeline.create_session("s1", &parsed).await.unwrap();
    assert_eq!(session.chunk_count(), parsed.chunks.len());
}

#[tokio::test]
async fn test_pdf_without_text_cannot_start_chat() {
    let parsed = parse_pdf(&build_pdf(Some("Scan"), &[""]), 1000).unwrap();
    let model = Arc::new(ScriptedChatModel::constant("ok"));
    let err = pipeline(model, small_chunks())
        .create_session("s1", &parsed)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RagError::EmptyDocument));
}

#[tokio::test]
async fn test_blank_question_rejected_without_history_change() {
    let parsed = parse_pdf(&sample_pdf(), 1000).unwrap();
    let model = Arc::new(ScriptedChatModel::constant("ok"));
    let mut session = pipeline(model.clone(), small_chunks())
        .create_session("s1", &parsed)
        .await
        .unwrap();

    let err = session.ask("   ", None).await.unwrap_err();
    assert!(matches!(err, RagError::EmptyQuestion));
    assert_eq!(session.message_count(), 0);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_session_locates_source_text() {
    let parsed = parse_pdf(&sample_pdf(), 1000).unwrap();
    let model = Arc::new(ScriptedChatModel::constant("ok"));
    let session = pipeline(model, small_chunks())
        .create_session("s1", &parsed)
        .await
        .unwrap();

    let located = session.locate("operating costs stayed flat").unwrap();
    assert_eq!(located.page_number, 2);
    assert!(session.locate("entirely unrelated sentence about penguins").is_none());
}

#[tokio::test]
async fn test_reinitialize_clears_history() {
    let parsed = parse_pdf(&sample_pdf(), 1000).unwrap();
    let model = Arc::new(ScriptedChatModel::constant("ok"));
    let mut session = pipeline(model, small_chunks())
        .create_session("s1", &parsed)
        .await
        .unwrap();
    session.ask("Did revenue grow?", None).await.unwrap();
    assert_eq!(session.message_count(), 2);

    let other = parse_pdf(&build_pdf(Some("Other"), &["A different document."]), 1000).unwrap();
    session.initialize(&other).await.unwrap();
    assert_eq!(session.message_count(), 0);
    assert_eq!(session.title(), "Other");
}
