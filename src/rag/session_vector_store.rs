// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Session-scoped vector storage for RAG
// Vectors live in memory for the lifetime of a chat session and are dropped with it

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

use super::errors::RagError;

/// Maximum metadata size per vector entry (10KB)
const MAX_METADATA_SIZE: usize = 10 * 1024;

/// A chunk of document text with its metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub page_content: String,
    pub metadata: Value,
}

impl Document {
    pub fn new(page_content: impl Into<String>, metadata: Value) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }
}

/// Entry stored in the vector store
#[derive(Clone, Debug)]
pub struct VectorEntry {
    pub vector: Vec<f32>,
    pub document: Document,
    pub created_at: Instant,
}

/// Result from vector search
#[derive(Clone, Debug)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub document: Document,
}

/// Session-scoped vector storage
/// - Stores chunk embeddings in memory for one chat session
/// - Dimension is fixed by the first vector unless given up front
/// - Supports semantic search via cosine similarity
#[derive(Debug)]
pub struct SessionVectorStore {
    session_id: String,
    vectors: HashMap<String, VectorEntry>,
    dimension: Option<usize>,
    max_vectors: usize,
}

impl SessionVectorStore {
    /// Create new session vector store
    ///
    /// # Arguments
    /// * `session_id` - Unique session identifier
    /// * `max_vectors` - Maximum number of vectors allowed (memory limit)
    pub fn new(session_id: String, max_vectors: usize) -> Self {
        Self {
            session_id,
            vectors: HashMap::new(),
            dimension: None,
            max_vectors,
        }
    }

    /// Create a store that only accepts vectors of `dimension`
    pub fn with_dimension(session_id: String, max_vectors: usize, dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::new(session_id, max_vectors)
        }
    }

    /// Add vector to store
    ///
    /// # Returns
    /// * `Ok(())` if added successfully
    /// * `Err` if dimensions invalid, values non-finite, metadata too large
    ///   or max capacity reached
    pub fn add(&mut self, id: String, vector: Vec<f32>, document: Document) -> Result<(), RagError> {
        if vector.is_empty() {
            return Err(RagError::InvalidVector("vector is empty".to_string()));
        }

        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        // NaN or Infinity would break similarity calculations
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(RagError::InvalidVector(
                "contains NaN or Infinity (all values must be finite numbers)".to_string(),
            ));
        }

        let metadata_size = serde_json::to_string(&document.metadata)
            .map(|s| s.len())
            .unwrap_or(usize::MAX);
        if metadata_size > MAX_METADATA_SIZE {
            return Err(RagError::InvalidVector(format!(
                "metadata too large: {} bytes (max: {} bytes)",
                metadata_size, MAX_METADATA_SIZE
            )));
        }

        // Check capacity (unless replacing existing)
        if !self.vectors.contains_key(&id) && self.vectors.len() >= self.max_vectors {
            return Err(RagError::CapacityExceeded {
                max: self.max_vectors,
            });
        }

        self.dimension.get_or_insert(vector.len());
        self.vectors.insert(
            id,
            VectorEntry {
                vector,
                document,
                created_at: Instant::now(),
            },
        );

        Ok(())
    }

    /// Add a batch of documents with their embeddings, ids `chunk-{index}`
    pub fn add_documents(
        &mut self,
        documents: Vec<Document>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<usize, RagError> {
        if documents.len() != vectors.len() {
            return Err(RagError::EmbeddingCountMismatch {
                expected: documents.len(),
                actual: vectors.len(),
            });
        }
        let offset = self.vectors.len();
        let count = documents.len();
        for (i, (document, vector)) in documents.into_iter().zip(vectors).enumerate() {
            self.add(format!("chunk-{:05}", offset + i), vector, document)?;
        }
        Ok(count)
    }

    pub fn get(&self, id: &str) -> Option<&VectorEntry> {
        self.vectors.get(id)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.vectors.remove(id).is_some()
    }

    pub fn count(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn max_vectors(&self) -> usize {
        self.max_vectors
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Top-k entries by cosine similarity, score descending.
    /// Ties are broken by id so results are stable.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, RagError> {
        self.search(query, k, None)
    }

    /// Search with an optional minimum similarity score
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>, RagError> {
        if self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(expected) = self.dimension {
            if query.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut results: Vec<SearchResult> = self
            .vectors
            .iter()
            .map(|(id, entry)| SearchResult {
                id: id.clone(),
                score: cosine_similarity(query, &entry.vector),
                document: entry.document.clone(),
            })
            .collect();

        if let Some(min_score) = threshold {
            results.retain(|r| r.score >= min_score);
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(k);

        Ok(results)
    }

    /// Search with metadata filtering
    ///
    /// Supports `{"field": {"$eq": value}}` and `{"field": {"$in": [values]}}`
    pub fn search_with_filter(
        &self,
        query: &[f32],
        k: usize,
        metadata_filter: &Value,
    ) -> Result<Vec<SearchResult>, RagError> {
        let mut all_results = self.search(query, self.vectors.len(), None)?;
        all_results.retain(|result| matches_filter(&result.document.metadata, metadata_filter));
        all_results.truncate(k);
        Ok(all_results)
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn matches_filter(metadata: &Value, filter: &Value) -> bool {
    let filter_obj = match filter.as_object() {
        Some(obj) => obj,
        None => return true,
    };

    for (field, condition) in filter_obj {
        let metadata_value = &metadata[field];
        let Some(condition_obj) = condition.as_object() else {
            if metadata_value != condition {
                return false;
            }
            continue;
        };
        for (op, expected) in condition_obj {
            match op.as_str() {
                "$eq" => {
                    if metadata_value != expected {
                        return false;
                    }
                }
                "$in" => {
                    if let Some(expected_array) = expected.as_array() {
                        if !expected_array.contains(metadata_value) {
                            return false;
                        }
                    }
                }
                _ => continue,
            }
        }
    }

    true
}
