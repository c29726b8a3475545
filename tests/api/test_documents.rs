// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/api/test_documents.rs - listing, deletion and signed URLs

use crate::common::*;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_list_only_own_documents_newest_first() {
    let test = test_app();
    let first = upload_sample(&test.app, ALICE_TOKEN).await;
    let second = upload_sample(&test.app, ALICE_TOKEN).await;
    upload_sample(&test.app, BOB_TOKEN).await;

    let (status, json) =
        send_json(&test.app, empty_request("GET", "/api/pdfs", Some(ALICE_TOKEN))).await;
    assert_eq!(status, StatusCode::OK);

    let documents = json["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["file_id"], second);
    assert_eq!(documents[1]["file_id"], first);
    assert!(documents.iter().all(|d| d["user_id"] == "alice"));
}

async fn document_id(test: &TestApp, file_id: &str) -> String {
    test.documents
        .all()
        .await
        .into_iter()
        .find(|d| d.file_id == file_id)
        .map(|d| d.id)
        .unwrap()
}

#[tokio::test]
async fn test_delete_removes_row_file_messages_and_sessions() {
    let test = test_app();
    let (file_id, session_id) = start_chat(&test.app, ALICE_TOKEN).await;
    let id = document_id(&test, &file_id).await;
    test.documents.add_chat_messages(&id, 3).await;

    let (status, json) = send_json(
        &test.app,
        empty_request("DELETE", &format!("/api/pdfs?id={}", id), Some(ALICE_TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["success"], true);
    assert_eq!(
        json["message"],
        "Document and associated data deleted successfully"
    );
    assert!(test.documents.all().await.is_empty());
    assert_eq!(test.documents.chat_message_count(&id).await, 0);
    assert!(test.storage.get("pdfs", &file_id).await.is_none());
    assert!(!test.state.sessions.contains(&session_id).await);
}

#[tokio::test]
async fn test_delete_via_legacy_path() {
    let test = test_app();
    let file_id = upload_sample(&test.app, ALICE_TOKEN).await;
    let id = document_id(&test, &file_id).await;

    let (status, _) = send_json(
        &test.app,
        empty_request(
            "DELETE",
            &format!("/api/pdfs/delete?id={}", id),
            Some(ALICE_TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(test.documents.all().await.is_empty());
}

#[tokio::test]
async fn test_delete_requires_id() {
    let test = test_app();
    let (status, json) =
        send_json(&test.app, empty_request("DELETE", "/api/pdfs", Some(ALICE_TOKEN))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Document ID is required");
}

#[tokio::test]
async fn test_cannot_delete_another_users_document() {
    let test = test_app();
    let file_id = upload_sample(&test.app, ALICE_TOKEN).await;
    let id = document_id(&test, &file_id).await;

    let (status, json) = send_json(
        &test.app,
        empty_request("DELETE", &format!("/api/pdfs?id={}", id), Some(BOB_TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        json["error"],
        "Document not found or you do not have permission to delete it"
    );
    assert_eq!(test.documents.all().await.len(), 1);
    assert!(test.storage.get("pdfs", &file_id).await.is_some());
}

#[tokio::test]
async fn test_failed_row_delete_keeps_file() {
    let test = test_app();
    let file_id = upload_sample(&test.app, ALICE_TOKEN).await;
    let id = document_id(&test, &file_id).await;
    test.documents.set_fail_deletes(true);

    let (status, json) = send_json(
        &test.app,
        empty_request("DELETE", &format!("/api/pdfs?id={}", id), Some(ALICE_TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to delete document");
    assert!(test.storage.get("pdfs", &file_id).await.is_some());
}

#[tokio::test]
async fn test_signed_url_for_own_file() {
    let test = test_app();
    let file_id = upload_sample(&test.app, ALICE_TOKEN).await;

    let (status, json) = send_json(
        &test.app,
        json_request(
            "POST",
            "/api/storage/get-signed-url",
            Some(ALICE_TOKEN),
            json!({ "path": file_id, "expiresIn": 120 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    let url = json["signedUrl"].as_str().unwrap();
    assert!(url.starts_with(&format!("memory://pdfs/{}?token=", file_id)));
    assert!(url.ends_with("expiresIn=120"));
}

#[tokio::test]
async fn test_signed_url_for_foreign_file() {
    let test = test_app();
    let file_id = upload_sample(&test.app, ALICE_TOKEN).await;

    let (status, json) = send_json(
        &test.app,
        json_request(
            "POST",
            "/api/storage/get-signed-url",
            Some(BOB_TOKEN),
            json!({ "path": file_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Document not found");
}

#[tokio::test]
async fn test_signed_url_validation() {
    let test = test_app();

    let (status, json) = send_json(
        &test.app,
        json_request(
            "POST",
            "/api/storage/get-signed-url",
            Some(ALICE_TOKEN),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Path is required");

    let (status, json) = send_json(
        &test.app,
        json_request(
            "POST",
            "/api/storage/get-signed-url",
            Some(ALICE_TOKEN),
            json!({ "path": "a.pdf", "bucket": "avatars" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"]["field"], "bucket");

    let (status, _) = send_json(
        &test.app,
        json_request(
            "POST",
            "/api/storage/get-signed-url",
            Some(ALICE_TOKEN),
            json!({ "path": "a.pdf", "expiresIn": 0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
