// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/common/mod.rs - PDF fixtures and an in-memory application
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdfmate::api::{create_app, AppState};
use pdfmate::config::{AppConfig, RagConfig};
use pdfmate::llm::{HashingEmbeddings, ScriptedChatModel};
use pdfmate::supabase::{MemoryDocuments, MemoryStorage, StaticTokenAuth};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";
pub const AUTH_CODE: &str = "good-code";
pub const BOUNDARY: &str = "pdfmate-test-boundary";

/// Build a PDF with one page per entry of `pages`; lines of a page are
/// separate text operations.
pub fn build_pdf(title: Option<&str>, pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for (i, line) in text.lines().enumerate() {
            if i > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Author" => Object::string_literal("PDFmate Tests"),
            "CreationDate" => Object::string_literal("D:20240115103000Z"),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A short two page report
pub fn sample_pdf() -> Vec<u8> {
    build_pdf(
        Some("Quarterly Report"),
        &[
            "Revenue grew by twelve percent in the third quarter.\nMost growth came from subscriptions.",
            "Operating costs stayed flat while headcount increased slightly.",
        ],
    )
}

/// Handles to the in-memory backends behind a test router
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub storage: Arc<MemoryStorage>,
    pub documents: Arc<MemoryDocuments>,
    pub chat_model: Arc<ScriptedChatModel>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.supabase.url = "https://project.supabase.co".to_string();
    config.rag = RagConfig {
        chunk_size: 200,
        chunk_overlap: 20,
        ..Default::default()
    };
    config
}

pub fn test_app() -> TestApp {
    test_app_with(test_config(), ScriptedChatModel::constant("Revenue grew by twelve percent."))
}

pub fn test_app_with(config: AppConfig, chat_model: ScriptedChatModel) -> TestApp {
    let storage = Arc::new(MemoryStorage::new());
    let documents = Arc::new(MemoryDocuments::new());
    let chat_model = Arc::new(chat_model);
    let auth = Arc::new(
        StaticTokenAuth::new()
            .with_user(ALICE_TOKEN, "alice")
            .with_user(BOB_TOKEN, "bob")
            .with_code(AUTH_CODE, "fresh-token", "alice"),
    );

    let state = AppState::new(
        config,
        auth,
        storage.clone(),
        documents.clone(),
        Arc::new(HashingEmbeddings::new(64)),
        chat_model.clone(),
    );
    TestApp {
        app: create_app(state.clone()),
        state,
        storage,
        documents,
        chat_model,
    }
}

/// Multipart body with a `file` part and optional text fields
pub fn multipart_body(file_name: &str, content_type: &str, bytes: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, file_name, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(uri: &str, method: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = send(app, request).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Upload `sample_pdf()` as `token` and return the file id
pub async fn upload_sample(app: &Router, token: &str) -> String {
    let body = multipart_body("report.pdf", "application/pdf", &sample_pdf(), &[]);
    let (status, json) = send_json(app, upload_request("/api/upload", "POST", token, body)).await;
    assert_eq!(status, StatusCode::OK, "upload failed: {}", json);
    json["fileId"].as_str().unwrap().to_string()
}

/// Upload and start a chat session; returns `(file_id, session_id)`
pub async fn start_chat(app: &Router, token: &str) -> (String, String) {
    let file_id = upload_sample(app, token).await;
    let (status, json) = send_json(
        app,
        json_request(
            "POST",
            "/api/chat/init",
            Some(token),
            serde_json::json!({ "fileId": file_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "init failed: {}", json);
    (file_id, json["sessionId"].as_str().unwrap().to_string())
}
