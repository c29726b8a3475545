// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/api/test_upload.rs

use crate::common::*;
use axum::http::StatusCode;
use pdfmate::llm::ScriptedChatModel;

#[tokio::test]
async fn test_upload_stores_file_and_metadata() {
    let test = test_app();
    let body = multipart_body("Q3 report.pdf", "application/pdf", &sample_pdf(), &[]);

    let (status, json) = send_json(
        &test.app,
        upload_request("/api/upload", "POST", ALICE_TOKEN, body),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["success"], true);
    assert_eq!(json["metadata"]["pageCount"], 2);
    assert_eq!(json["metadata"]["title"], "Quarterly Report");

    let file_id = json["fileId"].as_str().unwrap();
    assert!(file_id.ends_with("-Q3 report.pdf"));
    assert_eq!(
        json["publicUrl"],
        format!("memory://public/pdfs/{}", file_id)
    );

    let stored = test.storage.get("pdfs", file_id).await.unwrap();
    assert_eq!(stored.content_type, "application/pdf");
    assert_eq!(stored.bytes.as_ref(), sample_pdf().as_slice());

    let rows = test.documents.all().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, "alice");
    assert_eq!(rows[0].file_id, file_id);
    assert_eq!(rows[0].file_name, "Q3 report.pdf");
    assert_eq!(rows[0].page_count, 2);
}

#[tokio::test]
async fn test_upload_without_file() {
    let test = test_app();
    let body = format!("--{}--\r\n", BOUNDARY).into_bytes();

    let (status, json) = send_json(
        &test.app,
        upload_request("/api/upload", "POST", ALICE_TOKEN, body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_rejects_non_pdf() {
    let test = test_app();

    let body = multipart_body("notes.txt", "text/plain", b"plain text", &[]);
    let (status, _) = send_json(
        &test.app,
        upload_request("/api/upload", "POST", ALICE_TOKEN, body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Declared as a PDF but the bytes are not one
    let body = multipart_body("fake.pdf", "application/pdf", b"%PDF-1.4 garbage", &[]);
    let (status, _) = send_json(
        &test.app,
        upload_request("/api/upload", "POST", ALICE_TOKEN, body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(test.storage.is_empty().await);
    assert!(test.documents.all().await.is_empty());
}

#[tokio::test]
async fn test_upload_rejects_oversize_file() {
    let mut config = test_config();
    config.upload.max_bytes = 256;
    let test = test_app_with(config, ScriptedChatModel::constant("ok"));

    let body = multipart_body("big.pdf", "application/pdf", &sample_pdf(), &[]);
    let (status, json) = send_json(
        &test.app,
        upload_request("/api/upload", "POST", ALICE_TOKEN, body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn test_document_limit_per_user() {
    let mut config = test_config();
    config.upload.max_documents = 2;
    let test = test_app_with(config, ScriptedChatModel::constant("ok"));

    upload_sample(&test.app, ALICE_TOKEN).await;
    upload_sample(&test.app, ALICE_TOKEN).await;

    let body = multipart_body("third.pdf", "application/pdf", &sample_pdf(), &[]);
    let (status, json) = send_json(
        &test.app,
        upload_request("/api/upload", "POST", ALICE_TOKEN, body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Maximum of 2 PDFs allowed. Please delete one to upload a new one."
    );

    // The limit is per user
    upload_sample(&test.app, BOB_TOKEN).await;
    assert_eq!(test.storage.len().await, 3);
}

#[tokio::test]
async fn test_storage_failure_is_reported() {
    let test = test_app();
    test.storage.set_fail_uploads(true);

    let body = multipart_body("report.pdf", "application/pdf", &sample_pdf(), &[]);
    let (status, json) = send_json(
        &test.app,
        upload_request("/api/upload", "POST", ALICE_TOKEN, body),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to upload file");
    assert!(test.documents.all().await.is_empty());
}

#[tokio::test]
async fn test_failed_insert_removes_stored_file() {
    let test = test_app();
    test.documents.set_fail_inserts(true);

    let body = multipart_body("report.pdf", "application/pdf", &sample_pdf(), &[]);
    let (status, json) = send_json(
        &test.app,
        upload_request("/api/upload", "POST", ALICE_TOKEN, body),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to save PDF metadata");
    assert!(test.storage.is_empty().await);
}
