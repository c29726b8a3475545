// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/pdf/test_validation.rs

use crate::common::sample_pdf;
use pdfmate::config::UploadConfig;
use pdfmate::pdf::{validate_pdf_upload, PdfError};

#[test]
fn test_generated_pdf_is_accepted() {
    let limits = UploadConfig::default();
    assert!(validate_pdf_upload(Some("application/pdf"), &sample_pdf(), &limits).is_ok());
}

#[test]
fn test_size_limit_is_inclusive() {
    let bytes = sample_pdf();
    let exact = UploadConfig {
        max_bytes: bytes.len(),
        ..Default::default()
    };
    assert!(validate_pdf_upload(Some("application/pdf"), &bytes, &exact).is_ok());

    let smaller = UploadConfig {
        max_bytes: bytes.len() - 1,
        ..Default::default()
    };
    let err = validate_pdf_upload(Some("application/pdf"), &bytes, &smaller).unwrap_err();
    assert!(matches!(err, PdfError::TooLarge { .. }));
}

#[test]
fn test_pdf_bytes_with_wrong_content_type() {
    let err = validate_pdf_upload(Some("image/png"), &sample_pdf(), &UploadConfig::default())
        .unwrap_err();
    assert!(matches!(err, PdfError::InvalidContentType { .. }));
    assert!(err.is_client_error());
}

#[test]
fn test_text_file_renamed_to_pdf() {
    let err = validate_pdf_upload(
        Some("application/pdf"),
        b"just a text file",
        &UploadConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PdfError::NotAPdf));
}
