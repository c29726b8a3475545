// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Supabase clients: Auth, Storage and the document tables
//!
//! Each concern sits behind a trait so handlers can run against the HTTP
//! clients in production and the [`memory`] implementations in tests.

pub mod auth;
pub mod database;
pub mod errors;
pub mod memory;
pub mod models;
pub mod storage;

pub use auth::{verify_jwt, AuthVerifier, SupabaseAuth};
pub use database::{DocumentRepository, PostgrestRepository};
pub use errors::SupabaseError;
pub use memory::{MemoryDocuments, MemoryStorage, StaticTokenAuth};
pub use models::{AuthSession, AuthUser, NewPdfDocument, PdfDocument};
pub use storage::{ObjectStorage, SupabaseStorage};
