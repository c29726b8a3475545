// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Character-based text splitting
//!
//! Lengths are counted in `char`s, never bytes, so multi-byte text is never
//! cut inside a code point.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// How document text is cut into chunks before embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingStrategy {
    /// Consecutive fixed-size windows with no overlap
    Fixed,
    /// Separator-aware splitting with overlap
    Recursive,
}

impl FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(ChunkingStrategy::Fixed),
            "recursive" => Ok(ChunkingStrategy::Recursive),
            other => Err(format!(
                "unknown chunking strategy '{}', expected 'fixed' or 'recursive'",
                other
            )),
        }
    }
}

impl fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkingStrategy::Fixed => write!(f, "fixed"),
            ChunkingStrategy::Recursive => write!(f, "recursive"),
        }
    }
}

/// Split `text` into consecutive windows of `chunk_size` characters.
pub fn split_fixed(text: &str, chunk_size: usize) -> Vec<String> {
    if chunk_size == 0 || text.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|window| window.iter().collect())
        .collect()
}

/// Recursive character text splitter: splits on the coarsest separator present
/// in the text, merges the pieces back up to `chunk_size`, and recurses with
/// finer separators on pieces that are still too large.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveCharacterTextSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl RecursiveCharacterTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: ["\n\n", "\n", " ", ""].iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // Coarsest separator that occurs in the text; "" always matches
        let mut separator = separators.last().cloned().unwrap_or_default();
        let mut finer: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate.clone();
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.clone();
                finer = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut good_splits: Vec<String> = Vec::new();
        for split in splits {
            if char_len(&split) < self.chunk_size {
                good_splits.push(split);
                continue;
            }
            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, &separator));
                good_splits.clear();
            }
            if finer.is_empty() {
                final_chunks.push(split);
            } else {
                final_chunks.extend(self.split_with(&split, finer));
            }
        }
        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, &separator));
        }

        final_chunks
    }

    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let len = char_len(split);
            let joined_len = |current: &VecDeque<&str>| {
                if current.is_empty() {
                    0
                } else {
                    separator_len
                }
            };

            if total + len + joined_len(&current) > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }
                if !current.is_empty() {
                    if let Some(doc) = join_docs(&current, separator) {
                        docs.push(doc);
                    }
                    // Keep popping until the carried-over tail fits the overlap
                    // and leaves room for the incoming split
                    while total > self.chunk_overlap
                        || (total + len + joined_len(&current) > self.chunk_size && total > 0)
                    {
                        let Some(first) = current.pop_front() else {
                            break;
                        };
                        let removed = char_len(first)
                            + if current.is_empty() { 0 } else { separator_len };
                        total = total.saturating_sub(removed);
                    }
                }
            }

            current.push_back(split);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(doc) = join_docs(&current, separator) {
            docs.push(doc);
        }
        docs
    }
}

fn join_docs(docs: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = docs.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
