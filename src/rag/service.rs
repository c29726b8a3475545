// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-document chat pipeline
//!
//! A [`PdfChatSession`] owns the chunk embeddings of one parsed PDF, the
//! retrieval chain built on them and the conversation so far.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::chain::{ConversationalRetrievalChain, ScoredDocument};
use super::errors::RagError;
use super::locator::{LocatedText, PageIndex};
use super::prompts::ExplanationLevel;
use super::session_vector_store::{Document, SessionVectorStore};
use super::text_splitter::{ChunkingStrategy, RecursiveCharacterTextSplitter};
use crate::config::RagConfig;
use crate::llm::{ChatMessage, ChatModel, EmbeddingProvider, Role};
use crate::pdf::{PageText, ParsedPdf};

/// Models and settings shared by every session
#[derive(Clone)]
pub struct RagPipeline {
    embeddings: Arc<dyn EmbeddingProvider>,
    chat_model: Arc<dyn ChatModel>,
    config: RagConfig,
}

impl RagPipeline {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        chat_model: Arc<dyn ChatModel>,
        config: RagConfig,
    ) -> Self {
        Self {
            embeddings,
            chat_model,
            config,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Build and initialize a session for `parsed`
    pub async fn create_session(
        &self,
        session_id: &str,
        parsed: &ParsedPdf,
    ) -> Result<PdfChatSession, RagError> {
        let mut session = PdfChatSession::new(session_id, self.clone());
        session.initialize(parsed).await?;
        Ok(session)
    }

    /// Chunks fed to the vector store
    pub fn chunk(&self, parsed: &ParsedPdf) -> Vec<String> {
        match self.config.chunking {
            ChunkingStrategy::Fixed if !parsed.chunks.is_empty() => parsed.chunks.clone(),
            _ => RecursiveCharacterTextSplitter::new(
                self.config.chunk_size,
                self.config.chunk_overlap,
            )
            .split_text(&parsed.text),
        }
    }
}

/// One entry of the conversation as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

/// Answer with the chunks it was built from
#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub answer: String,
    pub source_documents: Vec<ScoredDocument>,
}

pub struct PdfChatSession {
    session_id: String,
    pipeline: RagPipeline,
    chain: Option<ConversationalRetrievalChain>,
    history: Vec<ChatMessage>,
    pages: Vec<PageText>,
    page_index: Option<PageIndex>,
    title: String,
    page_count: u32,
}

impl PdfChatSession {
    pub fn new(session_id: &str, pipeline: RagPipeline) -> Self {
        Self {
            session_id: session_id.to_string(),
            pipeline,
            chain: None,
            history: Vec::new(),
            pages: Vec::new(),
            page_index: None,
            title: String::new(),
            page_count: 0,
        }
    }

    /// Chunk, embed and index `parsed`, replacing any previous document and
    /// clearing the conversation.
    pub async fn initialize(&mut self, parsed: &ParsedPdf) -> Result<(), RagError> {
        let started = Instant::now();
        let chunks = self.pipeline.chunk(parsed);
        if chunks.is_empty() {
            return Err(RagError::EmptyDocument);
        }

        let page_index = PageIndex::new(&parsed.pages);
        let mut documents = Vec::with_capacity(chunks.len());
        let mut last_page = None;
        for (i, chunk) in chunks.iter().enumerate() {
            let mut metadata = json!({ "chunkIndex": i });
            if let Some(located) = page_index.locate_near(chunk, last_page) {
                metadata["pageNumber"] = json!(located.page_number);
                last_page = Some(located.page_number);
            }
            documents.push(Document::new(chunk.clone(), metadata));
        }

        let vectors = self.pipeline.embeddings.embed_documents(&chunks).await?;
        let mut store = SessionVectorStore::new(
            self.session_id.clone(),
            self.pipeline.config.max_chunks_per_session,
        );
        store.add_documents(documents, vectors)?;

        info!(
            "Session {} initialized: {} chunks from {} pages in {:?}",
            self.session_id,
            store.count(),
            parsed.metadata.page_count,
            started.elapsed()
        );

        self.chain = Some(ConversationalRetrievalChain::new(
            store,
            self.pipeline.embeddings.clone(),
            self.pipeline.chat_model.clone(),
            self.pipeline.config.top_k,
        ));
        self.pages = parsed.pages.clone();
        self.page_index = Some(page_index);
        self.title = parsed.display_title();
        self.page_count = parsed.metadata.page_count;
        self.history.clear();
        Ok(())
    }

    /// Ask a question about the document.
    ///
    /// The question is recorded before the chain runs and the answer after;
    /// a failed call leaves only the question in the history.
    pub async fn ask(
        &mut self,
        question: &str,
        level: Option<ExplanationLevel>,
    ) -> Result<ChatAnswer, RagError> {
        let chain = self.chain.as_ref().ok_or(RagError::NotInitialized)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::EmptyQuestion);
        }

        let prior_turns = self.history.len();
        self.history.push(ChatMessage::user(question));
        let output = chain
            .call(question, &self.history[..prior_turns], level)
            .await?;
        debug!(
            "Session {} answered with {} sources",
            self.session_id,
            output.source_documents.len()
        );
        self.history.push(ChatMessage::assistant(output.answer.clone()));

        Ok(ChatAnswer {
            answer: output.answer,
            source_documents: output.source_documents,
        })
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history
            .iter()
            .map(|message| HistoryEntry {
                role: match message.role {
                    Role::User => "user".to_string(),
                    _ => "assistant".to_string(),
                },
                content: message.content.clone(),
            })
            .collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.chain.is_some()
    }

    /// Find the page of `text` in this session's document
    pub fn locate(&self, text: &str) -> Option<LocatedText> {
        self.page_index.as_ref()?.locate(text)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn pages(&self) -> &[PageText] {
        &self.pages
    }

    pub fn chunk_count(&self) -> usize {
        self.chain.as_ref().map_or(0, |c| c.store().count())
    }

    pub fn message_count(&self) -> usize {
        self.history.len()
    }
}

/// Client-facing metadata of a source document: the stored chunk metadata
/// plus its similarity score
pub fn source_metadata(scored: &ScoredDocument) -> Value {
    let mut metadata = match &scored.document.metadata {
        Value::Object(map) => Value::Object(map.clone()),
        _ => json!({}),
    };
    metadata["score"] = json!(scored.score);
    metadata
}
