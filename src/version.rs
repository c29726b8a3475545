// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the PDFmate service

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-pdf-chat-2026-10-17";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-17";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "pdf-upload",
    "document-limit",
    "signed-urls",
    "recursive-chunking",
    "conversational-retrieval",
    "refine-qa",
    "explanation-levels",
    "source-locating",
    "session-expiry",
    "jwt-verification",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("PDFmate {} ({})", VERSION_NUMBER, BUILD_DATE)
}
