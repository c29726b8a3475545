// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deterministic providers for tests and offline runs

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use super::provider::{ChatMessage, ChatModel, EmbeddingProvider};
use super::LlmError;

/// Bag-of-words embeddings: each lowercase word is hashed into one of
/// `dimension` buckets and the vector is L2-normalized. Texts sharing words
/// get a high cosine similarity.
#[derive(Debug, Clone)]
pub struct HashingEmbeddings {
    dimension: usize,
}

impl Default for HashingEmbeddings {
    fn default() -> Self {
        Self::new(256)
    }
}

impl HashingEmbeddings {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        Ok(self.embed(text))
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

/// Chat model that replays queued replies and records every prompt.
///
/// Once the queue is empty the default reply is returned.
#[derive(Debug, Default)]
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<String>>,
    default_reply: String,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Always answer with `reply`
    pub fn constant(reply: impl Into<String>) -> Self {
        Self {
            default_reply: reply.into(),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Prompts received so far, oldest first
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(messages.to_vec());
        let next = self
            .replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        Ok(next.unwrap_or_else(|| self.default_reply.clone()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
