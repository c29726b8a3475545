// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::PdfError;
use crate::config::UploadConfig;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Check an uploaded file before it is stored or parsed.
///
/// The content type must match exactly (parameters such as `; charset=` are
/// ignored), the size must be within the configured limit and the bytes must
/// start with the PDF header.
pub fn validate_pdf_upload(
    content_type: Option<&str>,
    bytes: &[u8],
    limits: &UploadConfig,
) -> Result<(), PdfError> {
    let actual = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if actual != limits.accepted_content_type {
        return Err(PdfError::InvalidContentType {
            expected: limits.accepted_content_type.clone(),
            actual: if actual.is_empty() {
                "none".to_string()
            } else {
                actual
            },
        });
    }

    if bytes.is_empty() {
        return Err(PdfError::Empty);
    }

    if bytes.len() > limits.max_bytes {
        return Err(PdfError::TooLarge {
            size: bytes.len(),
            max: limits.max_bytes,
        });
    }

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(PdfError::NotAPdf);
    }

    Ok(())
}
