// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/rag/test_session_vector_store.rs

use pdfmate::llm::HashingEmbeddings;
use pdfmate::rag::{Document, RagError, SessionVectorStore};
use serde_json::json;

fn page_doc(text: &str, page: u32) -> Document {
    Document::new(text, json!({ "pageNumber": page }))
}

#[test]
fn test_search_ranks_related_chunks_first() {
    let embeddings = HashingEmbeddings::new(1024);
    let mut store = SessionVectorStore::new("session-1".to_string(), 100);
    let chunks = [
        ("The mitochondria is the powerhouse of the cell", 1),
        ("Quarterly revenue grew twelve percent", 2),
        ("Photosynthesis converts light into chemical energy", 3),
    ];
    for (i, (text, page)) in chunks.iter().enumerate() {
        store
            .add(format!("chunk-{}", i), embeddings.embed(text), page_doc(text, *page))
            .unwrap();
    }

    let query = embeddings.embed("Did quarterly revenue grow?");
    let results = store.similarity_search(&query, 2).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "chunk-1");
    assert_eq!(results[0].document.metadata["pageNumber"], 2);
    assert!(results[0].score >= results[1].score);
}

#[test]
fn test_first_vector_fixes_dimension() {
    let mut store = SessionVectorStore::new("session-1".to_string(), 10);
    store
        .add("a".to_string(), vec![1.0, 0.0, 0.0], page_doc("a", 1))
        .unwrap();
    assert_eq!(store.dimension(), Some(3));

    let err = store
        .add("b".to_string(), vec![1.0, 0.0], page_doc("b", 1))
        .unwrap_err();
    assert!(matches!(
        err,
        RagError::DimensionMismatch {
            expected: 3,
            actual: 2
        }
    ));
}

#[test]
fn test_capacity_allows_replacement() {
    let mut store = SessionVectorStore::new("session-1".to_string(), 1);
    store
        .add("a".to_string(), vec![1.0, 0.0], page_doc("first", 1))
        .unwrap();
    store
        .add("a".to_string(), vec![0.0, 1.0], page_doc("replaced", 1))
        .unwrap();
    assert_eq!(store.count(), 1);
    assert_eq!(store.get("a").unwrap().document.page_content, "replaced");

    let err = store
        .add("b".to_string(), vec![1.0, 1.0], page_doc("b", 1))
        .unwrap_err();
    assert!(matches!(err, RagError::CapacityExceeded { max: 1 }));
}

#[test]
fn test_non_finite_values_rejected() {
    let mut store = SessionVectorStore::new("session-1".to_string(), 10);
    let err = store
        .add("a".to_string(), vec![f32::NAN, 1.0], page_doc("a", 1))
        .unwrap_err();
    assert!(matches!(err, RagError::InvalidVector(_)));
    assert!(store.is_empty());
}

#[test]
fn test_add_documents_requires_matching_counts() {
    let mut store = SessionVectorStore::new("session-1".to_string(), 10);
    let err = store
        .add_documents(vec![page_doc("a", 1), page_doc("b", 1)], vec![vec![1.0]])
        .unwrap_err();
    assert!(matches!(
        err,
        RagError::EmbeddingCountMismatch {
            expected: 2,
            actual: 1
        }
    ));

    let added = store
        .add_documents(
            vec![page_doc("a", 1), page_doc("b", 2)],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();
    assert_eq!(added, 2);
    assert!(store.get("chunk-00000").is_some());
    assert!(store.get("chunk-00001").is_some());
}

#[test]
fn test_filter_by_page() {
    let mut store = SessionVectorStore::new("session-1".to_string(), 10);
    store
        .add("a".to_string(), vec![1.0, 0.0], page_doc("page one", 1))
        .unwrap();
    store
        .add("b".to_string(), vec![0.9, 0.1], page_doc("page two", 2))
        .unwrap();
    store
        .add("c".to_string(), vec![0.8, 0.2], page_doc("page three", 3))
        .unwrap();

    let results = store
        .search_with_filter(&[1.0, 0.0], 5, &json!({ "pageNumber": { "$in": [2, 3] } }))
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.document.metadata["pageNumber"] != 1));

    let results = store
        .search_with_filter(&[1.0, 0.0], 5, &json!({ "pageNumber": { "$eq": 1 } }))
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "a");
}

#[test]
fn test_empty_store_returns_no_results() {
    let store = SessionVectorStore::new("session-1".to_string(), 10);
    assert!(store.similarity_search(&[1.0, 0.0], 4).unwrap().is_empty());
}
