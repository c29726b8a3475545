// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document metadata over PostgREST (`/rest/v1`)

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

use super::errors::SupabaseError;
use super::models::{NewPdfDocument, PdfDocument};
use crate::config::SupabaseConfig;

const DOCUMENTS_TABLE: &str = "pdf_documents";
const CHAT_MESSAGES_TABLE: &str = "chat_messages";

/// Persistence of uploaded document metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Documents of `user_id`, newest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PdfDocument>, SupabaseError>;

    async fn count_for_user(&self, user_id: &str) -> Result<usize, SupabaseError>;

    /// Document `id` if it belongs to `user_id`
    async fn find_for_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<PdfDocument>, SupabaseError>;

    /// Document stored under `file_id` if it belongs to `user_id`
    async fn find_by_file_id(
        &self,
        file_id: &str,
        user_id: &str,
    ) -> Result<Option<PdfDocument>, SupabaseError>;

    async fn insert(&self, document: NewPdfDocument) -> Result<PdfDocument, SupabaseError>;

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), SupabaseError>;

    /// Remove chat messages stored for a document
    async fn delete_chat_messages(&self, document_id: &str) -> Result<(), SupabaseError>;
}

pub struct PostgrestRepository {
    base_url: String,
    service_key: String,
    client: Client,
}

impl PostgrestRepository {
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SupabaseError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            base_url: config.url.clone(),
            service_key: config.service_role_key.clone(),
            client,
        })
    }

    fn table(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn select(&self, filters: &[(&str, String)]) -> Result<Vec<PdfDocument>, SupabaseError> {
        let response = self
            .authorized(self.client.get(self.table(DOCUMENTS_TABLE)))
            .query(filters)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

async fn check(response: Response) -> Result<Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SupabaseError::from_status(status.as_u16(), body))
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl DocumentRepository for PostgrestRepository {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PdfDocument>, SupabaseError> {
        self.select(&[
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
        ])
        .await
    }

    async fn count_for_user(&self, user_id: &str) -> Result<usize, SupabaseError> {
        let response = self
            .authorized(self.client.get(self.table(DOCUMENTS_TABLE)))
            .query(&[("select", "id".to_string()), ("user_id", eq(user_id))])
            .send()
            .await?;
        let ids: Vec<serde_json::Value> = check(response).await?.json().await?;
        Ok(ids.len())
    }

    async fn find_for_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<PdfDocument>, SupabaseError> {
        let mut rows = self
            .select(&[
                ("select", "*".to_string()),
                ("id", eq(id)),
                ("user_id", eq(user_id)),
                ("limit", "1".to_string()),
            ])
            .await?;
        Ok(rows.pop())
    }

    async fn find_by_file_id(
        &self,
        file_id: &str,
        user_id: &str,
    ) -> Result<Option<PdfDocument>, SupabaseError> {
        let mut rows = self
            .select(&[
                ("select", "*".to_string()),
                ("file_id", eq(file_id)),
                ("user_id", eq(user_id)),
                ("limit", "1".to_string()),
            ])
            .await?;
        Ok(rows.pop())
    }

    async fn insert(&self, document: NewPdfDocument) -> Result<PdfDocument, SupabaseError> {
        let response = self
            .authorized(self.client.post(self.table(DOCUMENTS_TABLE)))
            .header("Prefer", "return=representation")
            .json(&document)
            .send()
            .await?;
        let mut rows: Vec<PdfDocument> = check(response).await?.json().await?;
        let row = rows.pop().ok_or_else(|| {
            SupabaseError::InvalidResponse("insert returned no rows".to_string())
        })?;
        debug!("Inserted document {} for user {}", row.id, row.user_id);
        Ok(row)
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), SupabaseError> {
        let response = self
            .authorized(self.client.delete(self.table(DOCUMENTS_TABLE)))
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_chat_messages(&self, document_id: &str) -> Result<(), SupabaseError> {
        let response = self
            .authorized(self.client.delete(self.table(CHAT_MESSAGES_TABLE)))
            .query(&[("document_id", eq(document_id))])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
