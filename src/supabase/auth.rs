// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Access token verification and PKCE code exchange
//!
//! With `SUPABASE_JWT_SECRET` configured, tokens are verified locally
//! (HS256, audience `authenticated`). Otherwise each unseen token is checked
//! against `GET /auth/v1/user`. Verified tokens are cached for a short TTL.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use lru::LruCache;
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::errors::SupabaseError;
use super::models::{AuthSession, AuthUser};
use crate::config::SupabaseConfig;

const JWT_AUDIENCE: &str = "authenticated";

/// Resolves access tokens to users
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    /// User owning `access_token`
    async fn verify(&self, access_token: &str) -> Result<AuthUser, SupabaseError>;

    /// Exchange an OAuth/magic-link code for a session (PKCE)
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<AuthSession, SupabaseError>;
}

/// JWT claims issued by Supabase Auth
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

pub struct SupabaseAuth {
    config: SupabaseConfig,
    client: Client,
    cache: Mutex<LruCache<String, (AuthUser, Instant)>>,
}

impl SupabaseAuth {
    pub fn new(config: SupabaseConfig) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SupabaseError::Http(format!("Failed to create HTTP client: {}", e)))?;
        let capacity = NonZeroUsize::new(config.token_cache_size).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            config,
            client,
            cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    async fn cached(&self, token: &str) -> Option<AuthUser> {
        let mut cache = self.cache.lock().await;
        let (user, expired) = match cache.get(token) {
            Some((user, verified_at)) if verified_at.elapsed() < self.config.token_cache_ttl => {
                (Some(user.clone()), false)
            }
            Some(_) => (None, true),
            None => (None, false),
        };
        if expired {
            cache.pop(token);
        }
        user
    }

    async fn remember(&self, token: &str, user: &AuthUser) {
        self.cache
            .lock()
            .await
            .put(token.to_string(), (user.clone(), Instant::now()));
    }

    async fn fetch_user(&self, token: &str) -> Result<AuthUser, SupabaseError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.config.url))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match SupabaseError::from_status(status.as_u16(), body) {
                SupabaseError::NotFound(message) => SupabaseError::Unauthorized(message),
                other => other,
            });
        }
        Ok(response.json::<AuthUser>().await?)
    }
}

/// Verify an HS256 Supabase access token
pub fn verify_jwt(token: &str, secret: &str) -> Result<AuthUser, SupabaseError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[JWT_AUDIENCE]);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| SupabaseError::Unauthorized(format!("invalid access token: {}", e)))?;

    Ok(AuthUser {
        id: data.claims.sub,
        email: data.claims.email,
    })
}

#[async_trait]
impl AuthVerifier for SupabaseAuth {
    async fn verify(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        if access_token.trim().is_empty() {
            return Err(SupabaseError::Unauthorized("empty access token".to_string()));
        }
        if let Some(user) = self.cached(access_token).await {
            return Ok(user);
        }

        let user = match &self.config.jwt_secret {
            Some(secret) => verify_jwt(access_token, secret)?,
            None => self.fetch_user(access_token).await?,
        };
        debug!("Verified access token for user {}", user.id);
        self.remember(access_token, &user).await;
        Ok(user)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.config.url))
            .query(&[("grant_type", "pkce")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({
                "auth_code": code,
                "code_verifier": code_verifier,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Code exchange failed with status {}", status);
            return Err(SupabaseError::from_status(status.as_u16(), body));
        }
        let session: AuthSession = response.json().await?;
        self.remember(&session.access_token, &session.user).await;
        Ok(session)
    }
}
