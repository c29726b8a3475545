// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// RAG (Retrieval-Augmented Generation) module
// Chunking, session-scoped vector search and conversational retrieval over one PDF

pub mod chain;
pub mod errors;
pub mod locator;
pub mod prompts;
pub mod service;
pub mod session_store;
pub mod session_vector_store;
pub mod text_splitter;

pub use chain::{ChainOutput, ConversationalRetrievalChain, ScoredDocument, NO_ANSWER_FALLBACK};
pub use errors::RagError;
pub use locator::{locate, LocatedText, MatchStrategy, PageIndex, TextSpan};
pub use prompts::ExplanationLevel;
pub use service::{source_metadata, ChatAnswer, HistoryEntry, PdfChatSession, RagPipeline};
pub use session_store::{ChatSessionStore, SessionEntry, SessionStoreConfig, StoreMetrics};
pub use session_vector_store::{Document, SearchResult, SessionVectorStore, VectorEntry};
pub use text_splitter::{split_fixed, ChunkingStrategy, RecursiveCharacterTextSplitter};
