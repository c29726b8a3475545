// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Chat API
//!
//! Sessions are created from a stored document (`/api/chat/init`) or from a
//! directly uploaded file (`PUT /api/chat`), then queried with
//! `/api/chat/ask`. Every route is scoped to the authenticated user.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{
    ask_handler, clear_session_handler, history_handler, init_handler, legacy_ask_handler,
    legacy_init_handler, locate_handler,
};
pub use request::{AskRequest, InitRequest, LocateRequest, SessionQuery};
pub use response::{
    AskResponse, ClearSessionResponse, HistoryResponse, InitResponse, LegacyAskResponse,
    LegacyInitResponse, LocateResponse, SourceDocument,
};
