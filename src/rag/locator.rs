// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Map a piece of text back to the page it came from
//!
//! Extracted text rarely matches a chunk byte for byte (line breaks, hyphen
//! spacing, casing), so matching runs on a normalized form: lowercase with
//! every whitespace run collapsed to one space. Spans are translated back to
//! byte offsets in the original page text.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::pdf::PageText;

/// Sentences shorter than this are too generic to pin a page
const MIN_SENTENCE_CHARS: usize = 20;
/// Keywords shorter than this are ignored
const MIN_KEYWORD_CHARS: usize = 4;
/// Fraction of keywords a page must contain
const MIN_KEYWORD_SCORE: f32 = 0.5;

const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "between", "both", "could", "does",
    "each", "from", "have", "having", "here", "into", "just", "more", "most", "much", "must",
    "only", "other", "over", "same", "should", "some", "such", "than", "that", "their", "them",
    "then", "there", "these", "they", "this", "those", "through", "under", "very", "were",
    "what", "when", "where", "which", "while", "will", "with", "would", "your",
];

/// Which heuristic produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Exact,
    Sentence,
    Keyword,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Exact => write!(f, "exact"),
            MatchStrategy::Sentence => write!(f, "sentence"),
            MatchStrategy::Keyword => write!(f, "keyword"),
        }
    }
}

/// Byte range in the original page text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatedText {
    pub page_number: u32,
    /// None for keyword matches
    pub span: Option<TextSpan>,
    pub strategy: MatchStrategy,
    /// 1.0 for exact matches, otherwise the matched fraction
    pub score: f32,
}

/// Lowercased, whitespace-collapsed text with a map back to source offsets
struct NormalizedText {
    text: String,
    /// For each byte of `text`, the byte range of the source char it came from
    origin: Vec<(usize, usize)>,
}

impl NormalizedText {
    fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut origin = Vec::with_capacity(source.len());
        let mut pending_space: Option<(usize, usize)> = None;

        for (start, ch) in source.char_indices() {
            let end = start + ch.len_utf8();
            if ch.is_whitespace() {
                if !text.is_empty() && pending_space.is_none() {
                    pending_space = Some((start, end));
                }
                continue;
            }
            if let Some(space) = pending_space.take() {
                text.push(' ');
                origin.push(space);
            }
            for lower in ch.to_lowercase() {
                text.push(lower);
                origin.extend(std::iter::repeat((start, end)).take(lower.len_utf8()));
            }
        }

        Self { text, origin }
    }

    fn find(&self, needle: &str) -> Option<TextSpan> {
        if needle.is_empty() {
            return None;
        }
        let pos = self.text.find(needle)?;
        let last = pos + needle.len() - 1;
        Some(TextSpan {
            start: self.origin[pos].0,
            end: self.origin[last].1,
        })
    }
}

/// Normalize text the same way page text is normalized before matching
pub fn normalize(text: &str) -> String {
    NormalizedText::new(text).text
}

/// Find the page containing `needle`.
///
/// Strategies run in order: exact normalized match, longest matching
/// sentence, then keyword overlap. Returns `None` when nothing matches well
/// enough.
pub fn locate(needle: &str, pages: &[PageText]) -> Option<LocatedText> {
    PageIndex::new(pages).locate(needle)
}

/// Normalized page texts, built once and queried many times
pub struct PageIndex {
    pages: Vec<(u32, NormalizedText)>,
}

impl PageIndex {
    pub fn new(pages: &[PageText]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|p| (p.page_number, NormalizedText::new(&p.text)))
                .collect(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn locate(&self, needle: &str) -> Option<LocatedText> {
        self.locate_near(needle, None)
    }

    /// Like [`PageIndex::locate`], but exact matching starts at `hint`.
    /// Consecutive chunks of a document usually sit on the same or next page.
    pub fn locate_near(&self, needle: &str, hint: Option<u32>) -> Option<LocatedText> {
        let normalized_needle = normalize(needle);
        if normalized_needle.is_empty() {
            return None;
        }

        let start = hint
            .and_then(|page| self.pages.iter().position(|(n, _)| *n == page))
            .unwrap_or(0);
        let (before, from_hint) = self.pages.split_at(start);

        locate_exact(&normalized_needle, from_hint.iter().chain(before))
            .or_else(|| locate_sentence(needle, &normalized_needle, &self.pages))
            .or_else(|| locate_keywords(&normalized_needle, &self.pages))
    }
}

fn locate_exact<'a>(
    needle: &str,
    mut pages: impl Iterator<Item = &'a (u32, NormalizedText)>,
) -> Option<LocatedText> {
    pages.find_map(|(page_number, page)| {
        page.find(needle).map(|span| LocatedText {
            page_number: *page_number,
            span: Some(span),
            strategy: MatchStrategy::Exact,
            score: 1.0,
        })
    })
}

fn locate_sentence(
    needle: &str,
    normalized_needle: &str,
    pages: &[(u32, NormalizedText)],
) -> Option<LocatedText> {
    let mut sentences: Vec<String> = needle
        .split(['.', '!', '?'])
        .map(normalize)
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .collect();
    sentences.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));

    let needle_len = normalized_needle.chars().count().max(1) as f32;
    for sentence in &sentences {
        for (page_number, page) in pages {
            if let Some(span) = page.find(sentence) {
                return Some(LocatedText {
                    page_number: *page_number,
                    span: Some(span),
                    strategy: MatchStrategy::Sentence,
                    score: (sentence.chars().count() as f32 / needle_len).min(1.0),
                });
            }
        }
    }
    None
}

fn locate_keywords(normalized_needle: &str, pages: &[(u32, NormalizedText)]) -> Option<LocatedText> {
    let keywords = keywords(normalized_needle);
    if keywords.is_empty() {
        return None;
    }

    let mut best: Option<(u32, f32)> = None;
    for (page_number, page) in pages {
        let words: HashSet<&str> = page
            .text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let hits = keywords.iter().filter(|k| words.contains(k.as_str())).count();
        let score = hits as f32 / keywords.len() as f32;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((*page_number, score));
        }
    }

    best.filter(|(_, score)| *score >= MIN_KEYWORD_SCORE)
        .map(|(page_number, score)| LocatedText {
            page_number,
            span: None,
            strategy: MatchStrategy::Keyword,
            score,
        })
}

/// Distinct lowercase words of 4+ letters that are not stop words
fn keywords(normalized: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_CHARS)
        .filter(|w| w.chars().all(char::is_alphabetic))
        .filter(|w| !STOP_WORDS.contains(w))
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}
