// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-memory implementations of the Supabase seams
//!
//! Used by the handler tests and for running the server without a Supabase
//! project. Signed URLs use the `memory://` scheme and are resolved by
//! [`MemoryStorage::fetch`].

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::auth::AuthVerifier;
use super::database::DocumentRepository;
use super::errors::SupabaseError;
use super::models::{AuthSession, AuthUser, NewPdfDocument, PdfDocument};
use super::storage::ObjectStorage;

const MEMORY_SCHEME: &str = "memory://";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Object storage keyed by `(bucket, path)`
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    fail_downloads: AtomicBool,
    fail_uploads: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `download` fail so callers exercise the signed URL fallback
    pub fn set_fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub async fn insert(&self, bucket: &str, path: &str, bytes: impl Into<Bytes>) {
        self.objects.write().await.insert(
            (bucket.to_string(), path.to_string()),
            StoredObject {
                bytes: bytes.into(),
                content_type: "application/pdf".to_string(),
            },
        );
    }

    pub async fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, SupabaseError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(SupabaseError::Api {
                status: 500,
                message: "upload failed".to_string(),
            });
        }
        let mut objects = self.objects.write().await;
        let key = (bucket.to_string(), path.to_string());
        if objects.contains_key(&key) {
            return Err(SupabaseError::Api {
                status: 409,
                message: "The resource already exists".to_string(),
            });
        }
        objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(path.to_string())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, SupabaseError> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(SupabaseError::Http("download unavailable".to_string()));
        }
        self.get(bucket, path)
            .await
            .map(|object| object.bytes)
            .ok_or_else(|| SupabaseError::NotFound(format!("{}/{}", bucket, path)))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), SupabaseError> {
        let mut objects = self.objects.write().await;
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u64,
    ) -> Result<String, SupabaseError> {
        if self.get(bucket, path).await.is_none() {
            return Err(SupabaseError::NotFound(format!("{}/{}", bucket, path)));
        }
        Ok(format!(
            "{}{}/{}?token={}&expiresIn={}",
            MEMORY_SCHEME,
            bucket,
            path,
            uuid::Uuid::new_v4(),
            expires_in
        ))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}public/{}/{}", MEMORY_SCHEME, bucket, path)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, SupabaseError> {
        let rest = url
            .strip_prefix(MEMORY_SCHEME)
            .ok_or_else(|| SupabaseError::InvalidRequest(format!("unsupported URL: {}", url)))?;
        let object = rest.split('?').next().unwrap_or_default();
        let (bucket, path) = object
            .split_once('/')
            .ok_or_else(|| SupabaseError::InvalidRequest(format!("malformed URL: {}", url)))?;
        self.get(bucket, path)
            .await
            .map(|object| object.bytes)
            .ok_or_else(|| SupabaseError::NotFound(url.to_string()))
    }
}

/// `pdf_documents` / `chat_messages` tables held in memory
#[derive(Debug, Default)]
pub struct MemoryDocuments {
    rows: RwLock<Vec<PdfDocument>>,
    chat_messages: RwLock<HashMap<String, usize>>,
    next_id: AtomicU64,
    fail_inserts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Record `count` chat messages for a document
    pub async fn add_chat_messages(&self, document_id: &str, count: usize) {
        *self
            .chat_messages
            .write()
            .await
            .entry(document_id.to_string())
            .or_default() += count;
    }

    pub async fn chat_message_count(&self, document_id: &str) -> usize {
        self.chat_messages
            .read()
            .await
            .get(document_id)
            .copied()
            .unwrap_or(0)
    }

    pub async fn all(&self) -> Vec<PdfDocument> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocuments {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PdfDocument>, SupabaseError> {
        let mut documents: Vec<PdfDocument> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        // Newest first; ids break ties between rows created in the same instant
        documents.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| {
                let a_id = a.id.parse::<u64>().unwrap_or(0);
                let b_id = b.id.parse::<u64>().unwrap_or(0);
                b_id.cmp(&a_id)
            })
        });
        Ok(documents)
    }

    async fn count_for_user(&self, user_id: &str) -> Result<usize, SupabaseError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|d| d.user_id == user_id)
            .count())
    }

    async fn find_for_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<PdfDocument>, SupabaseError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|d| d.id == id && d.user_id == user_id)
            .cloned())
    }

    async fn find_by_file_id(
        &self,
        file_id: &str,
        user_id: &str,
    ) -> Result<Option<PdfDocument>, SupabaseError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|d| d.file_id == file_id && d.user_id == user_id)
            .cloned())
    }

    async fn insert(&self, document: NewPdfDocument) -> Result<PdfDocument, SupabaseError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(SupabaseError::Api {
                status: 500,
                message: "insert failed".to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = PdfDocument {
            id: id.to_string(),
            user_id: document.user_id,
            file_id: document.file_id,
            file_name: document.file_name,
            storage_path: document.storage_path,
            title: document.title,
            page_count: document.page_count,
            created_at: Some(Utc::now()),
        };
        self.rows.write().await.push(row.clone());
        Ok(row)
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), SupabaseError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(SupabaseError::Api {
                status: 500,
                message: "delete failed".to_string(),
            });
        }
        self.rows
            .write()
            .await
            .retain(|d| !(d.id == id && d.user_id == user_id));
        Ok(())
    }

    async fn delete_chat_messages(&self, document_id: &str) -> Result<(), SupabaseError> {
        self.chat_messages.write().await.remove(document_id);
        Ok(())
    }
}

/// Accepts a fixed set of tokens and auth codes
#[derive(Debug, Default)]
pub struct StaticTokenAuth {
    tokens: HashMap<String, AuthUser>,
    codes: HashMap<String, AuthSession>,
}

impl StaticTokenAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, user_id: &str) -> Self {
        self.tokens.insert(
            token.to_string(),
            AuthUser {
                id: user_id.to_string(),
                email: Some(format!("{}@example.com", user_id)),
            },
        );
        self
    }

    /// Accept `code` and issue a session for `user_id` with `access_token`
    pub fn with_code(mut self, code: &str, access_token: &str, user_id: &str) -> Self {
        let user = AuthUser {
            id: user_id.to_string(),
            email: None,
        };
        self.tokens.insert(access_token.to_string(), user.clone());
        self.codes.insert(
            code.to_string(),
            AuthSession {
                access_token: access_token.to_string(),
                refresh_token: format!("{}-refresh", access_token),
                expires_in: 3600,
                token_type: "bearer".to_string(),
                user,
            },
        );
        self
    }
}

#[async_trait]
impl AuthVerifier for StaticTokenAuth {
    async fn verify(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        self.tokens
            .get(access_token)
            .cloned()
            .ok_or_else(|| SupabaseError::Unauthorized("unknown access token".to_string()))
    }

    async fn exchange_code(
        &self,
        code: &str,
        _code_verifier: &str,
    ) -> Result<AuthSession, SupabaseError> {
        self.codes
            .get(code)
            .cloned()
            .ok_or_else(|| SupabaseError::Unauthorized("invalid auth code".to_string()))
    }
}
