// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Conversational retrieval with a refine QA step
//!
//! 1. With prior history, condense history + question into a standalone question
//! 2. Embed it and retrieve the top-k chunks
//! 3. Answer from the first chunk, then refine the answer with each further chunk

use std::sync::Arc;
use tracing::{debug, info};

use super::errors::RagError;
use super::prompts::{self, ExplanationLevel};
use super::session_vector_store::{Document, SessionVectorStore};
use crate::llm::{ChatMessage, ChatModel, EmbeddingProvider};

/// Returned when the model produces no answer or nothing was retrieved
pub const NO_ANSWER_FALLBACK: &str =
    "I couldn't find an answer to that question in the document.";

/// A retrieved chunk and its similarity to the question
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub answer: String,
    pub source_documents: Vec<ScoredDocument>,
    /// Question used for retrieval (the condensed form when history exists)
    pub standalone_question: String,
}

pub struct ConversationalRetrievalChain {
    store: SessionVectorStore,
    embeddings: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn ChatModel>,
    top_k: usize,
}

impl ConversationalRetrievalChain {
    pub fn new(
        store: SessionVectorStore,
        embeddings: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn ChatModel>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embeddings,
            model,
            top_k: top_k.max(1),
        }
    }

    pub fn store(&self) -> &SessionVectorStore {
        &self.store
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `question` given the earlier turns in `history`.
    ///
    /// `history` must not contain `question` itself.
    pub async fn call(
        &self,
        question: &str,
        history: &[ChatMessage],
        level: Option<ExplanationLevel>,
    ) -> Result<ChainOutput, RagError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::EmptyQuestion);
        }

        let standalone_question = if history.is_empty() {
            question.to_string()
        } else {
            self.condense(history, question).await?
        };

        let source_documents = self.retrieve(&standalone_question).await?;
        if source_documents.is_empty() {
            info!("No chunks retrieved for question, returning fallback answer");
            return Ok(ChainOutput {
                answer: NO_ANSWER_FALLBACK.to_string(),
                source_documents,
                standalone_question,
            });
        }

        let answer = self
            .refine(&standalone_question, &source_documents, level)
            .await?;
        let answer = if answer.trim().is_empty() {
            NO_ANSWER_FALLBACK.to_string()
        } else {
            answer.trim().to_string()
        };

        Ok(ChainOutput {
            answer,
            source_documents,
            standalone_question,
        })
    }

    async fn condense(&self, history: &[ChatMessage], question: &str) -> Result<String, RagError> {
        let prompt = prompts::condense_question_prompt(history, question);
        let condensed = self.model.complete(&prompt).await?;
        let condensed = condensed.trim();
        debug!("Condensed question: {}", condensed);
        if condensed.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(condensed.to_string())
        }
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredDocument>, RagError> {
        if self.store.is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = self.embeddings.embed_query(query).await?;
        let results = self.store.similarity_search(&query_vector, self.top_k)?;
        Ok(results
            .into_iter()
            .map(|r| ScoredDocument {
                document: r.document,
                score: r.score,
            })
            .collect())
    }

    async fn refine(
        &self,
        question: &str,
        documents: &[ScoredDocument],
        level: Option<ExplanationLevel>,
    ) -> Result<String, RagError> {
        let mut answer = String::new();
        for (i, scored) in documents.iter().enumerate() {
            let context = &scored.document.page_content;
            let prompt = if i == 0 {
                prompts::qa_initial_prompt(context, question, level)
            } else {
                prompts::qa_refine_prompt(context, question, &answer, level)
            };
            answer = self.model.complete(&prompt).await?;
        }
        Ok(answer)
    }
}
