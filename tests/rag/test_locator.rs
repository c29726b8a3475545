// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/rag/test_locator.rs

use crate::common::build_pdf;
use pdfmate::pdf::{parse_pdf, PageText};
use pdfmate::rag::{locate, MatchStrategy, PageIndex};

fn pages() -> Vec<PageText> {
    vec![
        PageText {
            page_number: 1,
            text: "Chapter one introduces the hydrological cycle.\nWater evaporates from oceans and lakes."
                .to_string(),
        },
        PageText {
            page_number: 2,
            text: "Condensation forms clouds when vapour cools.\nPrecipitation returns water to the surface."
                .to_string(),
        },
        PageText {
            page_number: 3,
            text: "Groundwater recharge depends on soil permeability and rainfall intensity."
                .to_string(),
        },
    ]
}

#[test]
fn test_exact_match_across_line_break() {
    let pages = pages();
    let located = locate("vapour cools. PRECIPITATION returns", &pages).unwrap();

    assert_eq!(located.page_number, 2);
    assert_eq!(located.strategy, MatchStrategy::Exact);
    let span = located.span.unwrap();
    assert_eq!(
        &pages[1].text[span.start..span.end],
        "vapour cools.\nPrecipitation returns"
    );
}

#[test]
fn test_sentence_match_when_chunk_spans_pages() {
    // The chunk runs from the end of page 1 into page 2
    let chunk = "Water evaporates from oceans and lakes. Condensation forms clouds when vapour cools.";
    let located = locate(chunk, &pages()).unwrap();

    assert_eq!(located.strategy, MatchStrategy::Sentence);
    assert!(located.page_number == 1 || located.page_number == 2);
    assert!(located.score > 0.0 && located.score <= 1.0);
}

#[test]
fn test_keyword_match_on_paraphrase() {
    let located = locate(
        "permeability of soil controls groundwater recharge during rainfall",
        &pages(),
    )
    .unwrap();

    assert_eq!(located.page_number, 3);
    assert_eq!(located.strategy, MatchStrategy::Keyword);
    assert!(located.span.is_none());
}

#[test]
fn test_unrelated_text_not_found() {
    assert!(locate("stock options vesting schedule for employees", &pages()).is_none());
}

#[test]
fn test_locate_text_from_parsed_pdf() {
    let bytes = build_pdf(
        Some("Cycle"),
        &[
            "Water evaporates from oceans.",
            "Clouds form when vapour cools.\nRain falls back to the ground.",
        ],
    );
    let parsed = parse_pdf(&bytes, 1000).unwrap();
    let index = PageIndex::new(&parsed.pages);

    assert_eq!(index.page_count(), 2);
    let located = index.locate("rain falls back").unwrap();
    assert_eq!(located.page_number, 2);
}
