// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod auth;
pub mod auth_callback;
pub mod chat;
pub mod documents;
pub mod errors;
pub mod health;
pub mod http_server;
pub mod rate_limiter;
pub mod route_guard;
pub mod storage;
pub mod upload;

pub use auth::AuthenticatedUser;
pub use chat::{AskRequest, AskResponse, InitRequest, InitResponse, SourceDocument};
pub use errors::{ApiError, ErrorResponse};
pub use health::HealthResponse;
pub use http_server::{create_app, start_server, AppState};
pub use rate_limiter::AskRateLimiter;
pub use upload::{UploadResponse, UploadedFile};
