// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Supabase Storage client
//!
//! All calls use the service role key; callers are responsible for checking
//! that the requesting user owns the object.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::errors::SupabaseError;
use crate::config::SupabaseConfig;

/// Object storage operations used by the API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store a new object; fails if `path` already exists. Returns the path.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, SupabaseError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, SupabaseError>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), SupabaseError>;

    /// Time-limited download link for a private object
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u64,
    ) -> Result<String, SupabaseError>;

    /// Public URL of an object (only readable if the bucket is public)
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Download from an absolute URL such as a signed URL
    async fn fetch(&self, url: &str) -> Result<Bytes, SupabaseError>;
}

pub struct SupabaseStorage {
    base_url: String,
    service_key: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl SupabaseStorage {
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

    /// `{base}/storage/v1/{prefix...}/{bucket}/{path...}` with every segment
    /// percent-encoded
    fn object_url(&self, prefix: &[&str], bucket: &str, path: &str) -> Result<Url, SupabaseError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SupabaseError::InvalidRequest(format!("invalid Supabase URL: {}", e)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                SupabaseError::InvalidRequest("Supabase URL cannot be a base".to_string())
            })?;
            segments.pop_if_empty();
            segments.extend(["storage", "v1"]);
            segments.extend(prefix);
            segments.push(bucket);
            if !path.is_empty() {
                segments.extend(path.split('/'));
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
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

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, SupabaseError> {
        let url = self.object_url(&["object"], bucket, path)?;
        let size = bytes.len();
        let response = self
            .authorized(self.client.post(url))
            .header("content-type", content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        check(response).await?;
        info!("Uploaded {} bytes to {}/{}", size, bucket, path);
        Ok(path.to_string())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, SupabaseError> {
        let url = self.object_url(&["object"], bucket, path)?;
        let response = self.authorized(self.client.get(url)).send().await?;
        let bytes = check(response).await?.bytes().await?;
        debug!("Downloaded {} bytes from {}/{}", bytes.len(), bucket, path);
        Ok(bytes)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), SupabaseError> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = self.object_url(&["object"], bucket, "")?;
        let response = self
            .authorized(self.client.delete(url))
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await?;
        check(response).await?;
        info!("Removed {} objects from {}", paths.len(), bucket);
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u64,
    ) -> Result<String, SupabaseError> {
        let url = self.object_url(&["object", "sign"], bucket, path)?;
        let response = self
            .authorized(self.client.post(url))
            .json(&serde_json::json!({ "expiresIn": expires_in }))
            .send()
            .await?;
        let signed: SignedUrlResponse = check(response).await?.json().await?;
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        match self.object_url(&["object", "public"], bucket, path) {
            Ok(url) => url.to_string(),
            Err(_) => format!(
                "{}/storage/v1/object/public/{}/{}",
                self.base_url, bucket, path
            ),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, SupabaseError> {
        let response = self.client.get(url).send().await?;
        Ok(check(response).await?.bytes().await?)
    }
}
