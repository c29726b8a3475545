// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/rag/test_session_store.rs

use crate::common::sample_pdf;
use pdfmate::config::RagConfig;
use pdfmate::llm::{HashingEmbeddings, ScriptedChatModel};
use pdfmate::pdf::{parse_pdf, ParsedPdf};
use pdfmate::rag::{ChatSessionStore, RagError, RagPipeline, SessionStoreConfig};
use std::sync::Arc;
use std::time::Duration;

fn pipeline() -> RagPipeline {
    RagPipeline::new(
        Arc::new(HashingEmbeddings::new(64)),
        Arc::new(ScriptedChatModel::constant("ok")),
        RagConfig {
            chunk_size: 100,
            chunk_overlap: 10,
            ..Default::default()
        },
    )
}

fn parsed() -> ParsedPdf {
    parse_pdf(&sample_pdf(), 1000).unwrap()
}

fn store(max_sessions: usize) -> ChatSessionStore {
    ChatSessionStore::new(SessionStoreConfig {
        max_sessions,
        idle_timeout: Duration::from_secs(3600),
    })
}

#[tokio::test]
async fn test_generated_ids_are_uuids() {
    let store = store(10);
    let id = store
        .create(None, "alice", Some("file-1"), &parsed(), &pipeline())
        .await
        .unwrap();

    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert!(store.contains(&id).await);
    let entry = store.get(&id, "alice").await.unwrap();
    assert_eq!(entry.owner_id(), "alice");
    assert_eq!(entry.file_id(), Some("file-1"));
}

#[tokio::test]
async fn test_other_users_cannot_touch_session() {
    let store = store(10);
    let id = store
        .create(Some("chat-1"), "alice", None, &parsed(), &pipeline())
        .await
        .unwrap();
    assert_eq!(id, "chat-1");

    assert!(matches!(
        store.get("chat-1", "bob").await,
        Err(RagError::SessionOwnerMismatch(_))
    ));
    assert!(matches!(
        store.remove("chat-1", "bob").await,
        Err(RagError::SessionOwnerMismatch(_))
    ));
    assert!(matches!(
        store.create(Some("chat-1"), "bob", None, &parsed(), &pipeline()).await,
        Err(RagError::SessionOwnerMismatch(_))
    ));
    assert!(store.contains("chat-1").await);
}

#[tokio::test]
async fn test_owner_can_replace_session() {
    let store = store(1);
    let pipeline = pipeline();
    store
        .create(Some("chat-1"), "alice", None, &parsed(), &pipeline)
        .await
        .unwrap();
    {
        let entry = store.get("chat-1", "alice").await.unwrap();
        entry.lock().await.ask("Did revenue grow?", None).await.unwrap();
    }
    assert_eq!(store.history("chat-1", "alice").await.unwrap().len(), 2);

    // Replacing does not count against the limit and starts a new conversation
    store
        .create(Some("chat-1"), "alice", None, &parsed(), &pipeline)
        .await
        .unwrap();
    assert_eq!(store.len().await, 1);
    assert!(store.history("chat-1", "alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_session_limit() {
    let store = store(1);
    store
        .create(Some("a"), "alice", None, &parsed(), &pipeline())
        .await
        .unwrap();
    let err = store
        .create(Some("b"), "alice", None, &parsed(), &pipeline())
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::SessionLimitReached { max: 1 }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_invalid_session_id_rejected() {
    let store = store(10);
    let long_id = "x".repeat(500);
    for bad in ["has spaces", "semi;colon", long_id.as_str()] {
        let err = store
            .create(Some(bad), "alice", None, &parsed(), &pipeline())
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::InvalidSessionId(_)), "accepted {}", bad);
    }
}

#[tokio::test]
async fn test_history_of_unknown_session_is_empty() {
    let store = store(10);
    assert!(store.history("missing", "alice").await.unwrap().is_empty());
    assert!(!store.remove("missing", "alice").await.unwrap());
}

#[tokio::test]
async fn test_remove_for_file_only_drops_owner_sessions() {
    let store = store(10);
    let pipeline = pipeline();
    let doc = parsed();
    store
        .create(Some("a1"), "alice", Some("file-1"), &doc, &pipeline)
        .await
        .unwrap();
    store
        .create(Some("a2"), "alice", Some("file-2"), &doc, &pipeline)
        .await
        .unwrap();
    store
        .create(Some("b1"), "bob", Some("file-1"), &doc, &pipeline)
        .await
        .unwrap();

    assert_eq!(store.remove_for_file("alice", "file-1").await, 1);
    assert!(!store.contains("a1").await);
    assert!(store.contains("a2").await);
    assert!(store.contains("b1").await);
}

#[tokio::test]
async fn test_idle_sessions_expire() {
    let store = ChatSessionStore::new(SessionStoreConfig {
        max_sessions: 10,
        idle_timeout: Duration::from_millis(20),
    });
    store
        .create(Some("a"), "alice", None, &parsed(), &pipeline())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(store.cleanup_expired().await, 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_metrics_count_messages_and_chunks() {
    let store = store(10);
    store
        .create(Some("a"), "alice", None, &parsed(), &pipeline())
        .await
        .unwrap();
    {
        let entry = store.get("a", "alice").await.unwrap();
        entry.lock().await.ask("Did revenue grow?", None).await.unwrap();
    }

    let metrics = store.metrics().await;
    assert_eq!(metrics.total_sessions, 1);
    assert_eq!(metrics.idle_sessions, 1);
    assert_eq!(metrics.total_messages, 2);
    assert!(metrics.total_chunks >= 1);
}
