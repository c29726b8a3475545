// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request authentication
//!
//! The access token is read from `Authorization: Bearer <token>` and, when
//! that header is absent, from the configured auth cookie.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use super::{ApiError, AppState};
use crate::supabase::AuthUser;

/// The verified user behind a request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthUser);

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

/// Access token carried by a request, if any
pub fn access_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => CookieJar::from_headers(headers)
            .get(cookie_name)
            .map(|cookie| cookie.value().trim().to_string())
            .filter(|token| !token.is_empty()),
    }
}

/// Verify the request's token; `None` for anonymous or invalid tokens
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<AuthUser> {
    let token = access_token(headers, &state.config.supabase.auth_cookie)?;
    match state.auth.verify(&token).await {
        Ok(user) => Some(user),
        Err(err) => {
            debug!("Rejected access token: {}", err);
            None
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        current_user(state, &parts.headers)
            .await
            .map(AuthenticatedUser)
            .ok_or_else(ApiError::authentication_required)
    }
}
