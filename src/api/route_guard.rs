// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Redirects for page routes
//!
//! Protected pages send anonymous visitors to `/login`; the login page sends
//! signed-in users on to `/upload`. API, auth and health routes pass through.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::auth::current_user;
use super::AppState;

const PROTECTED_PREFIXES: &[&str] = &["/upload", "/chat"];
const AUTH_PREFIXES: &[&str] = &["/login"];
const PASSTHROUGH_PREFIXES: &[&str] = &["/api", "/auth", "/health"];

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/upload";

/// Whether `path` is `prefix` itself or below it
fn has_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
}

fn matches_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| has_prefix(path, prefix))
}

pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if matches_any(&path, PASSTHROUGH_PREFIXES) {
        return next.run(request).await;
    }

    let protected = matches_any(&path, PROTECTED_PREFIXES);
    let auth_page = matches_any(&path, AUTH_PREFIXES);
    if !protected && !auth_page {
        return next.run(request).await;
    }

    let signed_in = current_user(&state, request.headers()).await.is_some();
    if protected && !signed_in {
        return Redirect::to(LOGIN_PATH).into_response();
    }
    if auth_page && signed_in {
        return Redirect::to(HOME_PATH).into_response();
    }
    next.run(request).await
}
