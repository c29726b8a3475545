// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GET /auth/callback - finish an OAuth or magic-link sign-in

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{error, info};

use super::route_guard::HOME_PATH;
use super::AppState;
use crate::supabase::AuthSession;

pub const AUTH_FAILED_REDIRECT: &str = "/?error=Authentication%20failed";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
}

fn session_cookie(name: String, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn store_session(state: &AppState, jar: CookieJar, session: AuthSession) -> CookieJar {
    let supabase = &state.config.supabase;
    let secure = state.config.server.secure_cookies;
    let jar = jar
        .add(session_cookie(
            supabase.auth_cookie.clone(),
            session.access_token,
            secure,
        ))
        .remove(Cookie::build(supabase.code_verifier_cookie()).path("/"));
    if session.refresh_token.is_empty() {
        jar
    } else {
        jar.add(session_cookie(
            supabase.refresh_cookie(),
            session.refresh_token,
            secure,
        ))
    }
}

/// Exchange `code` for a session, store the tokens in cookies and continue
/// to the upload page. The PKCE verifier is read from its cookie.
pub async fn auth_callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let code = match query.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => return Redirect::to("/").into_response(),
    };

    let verifier = jar
        .get(&state.config.supabase.code_verifier_cookie())
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_default();

    match state.auth.exchange_code(&code, &verifier).await {
        Ok(session) => {
            info!("User {} signed in", session.user.id);
            let jar = store_session(&state, jar, session);
            (jar, Redirect::to(HOME_PATH)).into_response()
        }
        Err(e) => {
            error!("Error in auth callback: {}", e);
            Redirect::to(AUTH_FAILED_REDIRECT).into_response()
        }
    }
}
