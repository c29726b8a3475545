// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/pdf/test_parser.rs

use crate::common::{build_pdf, sample_pdf};
use bytes::Bytes;
use chrono::Datelike;
use pdfmate::pdf::{extract_page_text, parse_pdf, parse_pdf_blocking, PdfError};

#[test]
fn test_parse_extracts_pages_in_order() {
    let parsed = parse_pdf(&sample_pdf(), 1000).unwrap();

    assert_eq!(parsed.metadata.page_count, 2);
    assert_eq!(parsed.pages.len(), 2);
    assert_eq!(parsed.pages[0].page_number, 1);
    assert_eq!(parsed.pages[1].page_number, 2);
    assert!(parsed.pages[0].text.contains("Revenue grew"));
    assert!(parsed.pages[1].text.contains("Operating costs"));

    let first = parsed.text.find("Revenue").unwrap();
    let second = parsed.text.find("Operating").unwrap();
    assert!(first < second);
}

#[test]
fn test_parse_reads_info_dictionary() {
    let parsed = parse_pdf(&sample_pdf(), 1000).unwrap();

    assert_eq!(parsed.metadata.title.as_deref(), Some("Quarterly Report"));
    assert_eq!(parsed.metadata.author.as_deref(), Some("PDFmate Tests"));
    assert_eq!(parsed.display_title(), "Quarterly Report");
    let created = parsed.metadata.creation_date.unwrap();
    assert_eq!(created.year(), 2024);
    assert_eq!(created.month(), 1);
    assert!(parsed.metadata.info.contains_key("Title"));
}

#[test]
fn test_missing_title_uses_default() {
    let bytes = build_pdf(None, &["Just some text on a page."]);
    let parsed = parse_pdf(&bytes, 1000).unwrap();

    assert!(parsed.metadata.title.is_none());
    assert_eq!(parsed.display_title(), "Untitled Document");
}

#[test]
fn test_fixed_chunks_cover_text() {
    let bytes = build_pdf(
        Some("Long"),
        &["alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu"],
    );
    let parsed = parse_pdf(&bytes, 10).unwrap();

    assert!(parsed.chunks.len() > 1);
    assert!(parsed.chunks.iter().all(|c| c.chars().count() <= 10));
    assert_eq!(parsed.chunks.concat(), parsed.text);
}

#[test]
fn test_blank_page_parses_without_text() {
    let bytes = build_pdf(Some("Scanned"), &[""]);
    let parsed = parse_pdf(&bytes, 1000).unwrap();

    assert_eq!(parsed.metadata.page_count, 1);
    assert!(!parsed.has_text());
    assert!(parsed.chunks.is_empty());
}

#[test]
fn test_extract_single_page() {
    let bytes = sample_pdf();
    let text = extract_page_text(&bytes, 2).unwrap();
    assert!(text.contains("headcount"));
    assert!(!text.contains("Revenue"));
}

#[test]
fn test_extract_page_out_of_range() {
    let bytes = sample_pdf();
    let err = extract_page_text(&bytes, 3).unwrap_err();
    assert!(matches!(
        err,
        PdfError::PageOutOfRange {
            page: 3,
            page_count: 2
        }
    ));
    assert!(extract_page_text(&bytes, 0).is_err());
}

#[test]
fn test_truncated_pdf_is_a_parse_error() {
    let bytes = sample_pdf();
    let err = parse_pdf(&bytes[..bytes.len() / 3], 1000).unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_parse_on_blocking_pool() {
    let parsed = parse_pdf_blocking(Bytes::from(sample_pdf()), 1000)
        .await
        .unwrap();
    assert_eq!(parsed.metadata.page_count, 2);
}
