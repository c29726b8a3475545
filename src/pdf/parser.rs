// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text, page and metadata extraction with lopdf

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lopdf::{Dictionary, Document, Object};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::PdfError;
use crate::rag::text_splitter::split_fixed;

/// Separator placed between page texts in [`ParsedPdf::text`]
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Text extracted from a single page (1-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// Document information dictionary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfMetadata {
    pub page_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    /// Every decodable entry of the info dictionary
    pub info: BTreeMap<String, String>,
}

/// A parsed PDF: full text, per-page text, metadata and fixed-size chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPdf {
    pub text: String,
    pub metadata: PdfMetadata,
    pub chunks: Vec<String>,
    pub pages: Vec<PageText>,
}

impl ParsedPdf {
    /// Title from the metadata, or "Untitled Document"
    pub fn display_title(&self) -> String {
        self.metadata
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled Document")
            .to_string()
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Parse a PDF held in memory.
///
/// Pages whose text cannot be extracted contribute an empty string; a
/// document without a text layer parses successfully with empty text.
pub fn parse_pdf(bytes: &[u8], chunk_size: usize) -> Result<ParsedPdf, PdfError> {
    let doc = Document::load_mem(bytes)?;
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

    let mut pages = Vec::with_capacity(page_numbers.len());
    for page_number in &page_numbers {
        let text = match doc.extract_text(&[*page_number]) {
            Ok(text) => normalize_page_text(&text),
            Err(e) => {
                warn!("Failed to extract text from page {}: {}", page_number, e);
                String::new()
            }
        };
        pages.push(PageText {
            page_number: *page_number,
            text,
        });
    }

    let text = pages
        .iter()
        .map(|p| p.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR);

    let mut metadata = extract_metadata(&doc);
    metadata.page_count = page_numbers.len() as u32;

    let chunks = split_fixed(&text, chunk_size);
    debug!(
        "Parsed PDF: {} pages, {} characters, {} chunks",
        metadata.page_count,
        text.chars().count(),
        chunks.len()
    );

    Ok(ParsedPdf {
        text,
        metadata,
        chunks,
        pages,
    })
}

/// Extract the text of one page (1-based)
pub fn extract_page_text(bytes: &[u8], page_number: u32) -> Result<String, PdfError> {
    let doc = Document::load_mem(bytes)?;
    let page_count = doc.get_pages().len() as u32;
    if page_number == 0 || page_number > page_count {
        return Err(PdfError::PageOutOfRange {
            page: page_number,
            page_count,
        });
    }
    let text = doc.extract_text(&[page_number])?;
    Ok(normalize_page_text(&text))
}

fn normalize_page_text(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn extract_metadata(doc: &Document) -> PdfMetadata {
    let info = match info_dictionary(doc) {
        Some(info) => info,
        None => return PdfMetadata::default(),
    };

    let mut entries = BTreeMap::new();
    for (key, value) in info.iter() {
        if let Some(text) = object_to_string(value) {
            entries.insert(String::from_utf8_lossy(key).into_owned(), text);
        }
    }

    let non_empty = |key: &str| {
        entries
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    PdfMetadata {
        page_count: 0,
        title: non_empty("Title"),
        author: non_empty("Author"),
        subject: non_empty("Subject"),
        creation_date: entries.get("CreationDate").and_then(|d| parse_pdf_date(d)),
        info: entries,
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn object_to_string(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Integer(i) => Some(i.to_string()),
        Object::Real(r) => Some(r.to_string()),
        Object::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when it carries a BOM, otherwise bytes
/// are read as Latin-1 compatible text.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (cow, _, _) = encoding_rs::UTF_16BE.decode(&bytes[2..]);
        cow.into_owned()
    } else if let Ok(text) = std::str::from_utf8(bytes) {
        text.to_string()
    } else {
        let (cow, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
        cow.into_owned()
    }
}

/// Parse a PDF date string such as `D:20240131093000+01'00'`.
///
/// Missing trailing components default to their minimum; a missing zone is
/// read as UTC.
pub fn parse_pdf_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let value = value.strip_prefix("D:").unwrap_or(value);
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }

    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(s) => s.parse().ok(),
            None => Some(default),
        }
    };

    let year: i32 = digits[0..4].parse().ok()?;
    let month = field(4, 2, 1)?;
    let day = field(6, 2, 1)?;
    let hour = field(8, 2, 0)?;
    let minute = field(10, 2, 0)?;
    let second = field(12, 2, 0)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

    let rest = &value[digits.len()..];
    let offset_secs = match rest.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let zone: String = rest[1..].chars().filter(|c| c.is_ascii_digit()).collect();
            let hours: i32 = zone.get(0..2).and_then(|s| s.parse().ok()).unwrap_or(0);
            let minutes: i32 = zone.get(2..4).and_then(|s| s.parse().ok()).unwrap_or(0);
            let secs = hours * 3600 + minutes * 60;
            if sign == '-' {
                -secs
            } else {
                secs
            }
        }
        _ => 0,
    };

    let offset = FixedOffset::east_opt(offset_secs)?;
    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}
