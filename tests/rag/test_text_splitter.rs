// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/rag/test_text_splitter.rs

use pdfmate::rag::{split_fixed, RecursiveCharacterTextSplitter};

fn report_text() -> String {
    let paragraph = "Revenue grew in every region during the year. \
                     Subscription income made up most of the increase, \
                     while hardware sales were flat.";
    vec![paragraph; 12].join("\n\n")
}

#[test]
fn test_recursive_chunks_respect_size() {
    let splitter = RecursiveCharacterTextSplitter::new(200, 40);
    let chunks = splitter.split_text(&report_text());

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 200, "chunk too long: {}", chunk);
        assert!(!chunk.trim().is_empty());
    }
}

#[test]
fn test_recursive_chunks_overlap_on_words() {
    let text = (0..60)
        .map(|i| format!("word{:02}", i))
        .collect::<Vec<_>>()
        .join(" ");
    let splitter = RecursiveCharacterTextSplitter::new(50, 15);
    let chunks = splitter.split_text(&text);

    assert!(chunks.len() > 2);
    for pair in chunks.windows(2) {
        let last_word = pair[0].split(' ').last().unwrap();
        assert!(
            pair[1].contains(last_word),
            "expected '{}' to carry over into '{}'",
            last_word,
            pair[1]
        );
    }
}

#[test]
fn test_every_word_survives_splitting() {
    let text = report_text();
    let splitter = RecursiveCharacterTextSplitter::new(120, 20);
    let joined = splitter.split_text(&text).join(" ");
    for word in text.split_whitespace() {
        assert!(joined.contains(word), "missing word {}", word);
    }
}

#[test]
fn test_fixed_windows_have_no_overlap() {
    let text = report_text();
    let chunks = split_fixed(&text, 100);

    assert_eq!(chunks.concat(), text);
    let (last, full) = chunks.split_last().unwrap();
    assert!(full.iter().all(|c| c.chars().count() == 100));
    assert!(last.chars().count() <= 100);
}

#[test]
fn test_fixed_windows_count_characters() {
    let text = "é".repeat(25);
    let chunks = split_fixed(&text, 10);
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[2].chars().count(), 5);
}
