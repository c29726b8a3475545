// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAI API client
//!
//! Implements [`EmbeddingProvider`] over `/embeddings` and [`ChatModel`] over
//! `/chat/completions`. Rate limits (429) and server errors (5xx) are retried
//! with exponential backoff.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::provider::{ChatMessage, ChatModel, EmbeddingProvider};
use super::LlmError;
use crate::config::OpenAiConfig;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// OpenAI client for embeddings and chat completions
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// POST `body` to `path`, retrying rate limits and server errors
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.config.base_url, path);
        let mut attempt = 0u32;

        loop {
            match self.send_once(&url, body).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "OpenAI request to {} failed (attempt {}/{}): {}; retrying in {:?}",
                        path,
                        attempt + 1,
                        self.config.max_retries + 1,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once<B, R>(&self, url: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_secs: self.config.request_timeout.as_secs(),
                    }
                } else {
                    LlmError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(status_error(status, message));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("JSON parse error: {}", e)))
    }
}

fn status_error(status: StatusCode, message: String) -> LlmError {
    let message = api_error_message(&message).unwrap_or(message);
    match status {
        StatusCode::UNAUTHORIZED => LlmError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(message),
        _ => LlmError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Extract `error.message` from an OpenAI error body
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

fn backoff_delay(attempt: u32) -> Duration {
    INITIAL_BACKOFF
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_BACKOFF)
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        // Newlines degrade ada-002 embeddings
        let input = batch.iter().map(|t| t.replace('\n', " ")).collect();
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input,
        };
        let mut response: EmbeddingResponse = self.post_json("/embeddings", &request).await?;

        if response.data.len() != batch.len() {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                response.data.len()
            )));
        }
        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.embedding_batch_size.max(1)) {
            debug!("Embedding batch of {} chunks", batch.len());
            embeddings.extend(self.embed_batch(batch).await?);
        }
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| LlmError::InvalidResponse("no embedding returned".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.config.chat_model,
            messages,
            temperature: self.config.temperature,
        };
        let response: ChatCompletionResponse =
            self.post_json("/chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::InvalidResponse("no choices returned".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.chat_model
    }
}
