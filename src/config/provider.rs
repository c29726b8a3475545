// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Settings for the hosted services: Supabase and OpenAI

use std::env;
use std::time::Duration;

use super::{env_parse, env_required, ConfigError};

/// Supabase project settings
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`
    pub url: String,
    /// Public key used for auth calls on behalf of a user
    pub anon_key: String,
    /// Admin key for storage and database calls
    pub service_role_key: String,
    /// HS256 secret; when present access tokens are verified locally
    pub jwt_secret: Option<String>,
    pub storage_bucket: String,
    /// Cookie carrying the user's access token
    pub auth_cookie: String,
    pub request_timeout: Duration,
    pub token_cache_size: usize,
    pub token_cache_ttl: Duration,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            service_role_key: String::new(),
            jwt_secret: None,
            storage_bucket: "pdfs".to_string(),
            auth_cookie: "sb-access-token".to_string(),
            request_timeout: Duration::from_secs(30),
            token_cache_size: 1024,
            token_cache_ttl: Duration::from_secs(60),
        }
    }
}

impl SupabaseConfig {
    pub fn from_env(missing: &mut Vec<String>) -> Self {
        let defaults = Self::default();
        Self {
            url: env_required("SUPABASE_URL", missing)
                .trim_end_matches('/')
                .to_string(),
            anon_key: env_required("SUPABASE_ANON_KEY", missing),
            service_role_key: env_required("SUPABASE_SERVICE_ROLE_KEY", missing),
            jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            storage_bucket: env::var("SUPABASE_STORAGE_BUCKET")
                .unwrap_or(defaults.storage_bucket),
            auth_cookie: env::var("SUPABASE_AUTH_COOKIE").unwrap_or(defaults.auth_cookie),
            request_timeout: env_parse("SUPABASE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            token_cache_size: defaults.token_cache_size,
            token_cache_ttl: defaults.token_cache_ttl,
        }
    }

    /// Name of the cookie holding the refresh token
    pub fn refresh_cookie(&self) -> String {
        format!("{}-refresh", self.auth_cookie)
    }

    /// Name of the cookie holding the PKCE code verifier
    pub fn code_verifier_cookie(&self) -> String {
        format!("{}-code-verifier", self.auth_cookie)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "SUPABASE_URL".to_string(),
                reason: format!("'{}' is not a valid URL", self.url),
            });
        }
        if self.storage_bucket.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "SUPABASE_STORAGE_BUCKET".to_string(),
                reason: "bucket name cannot be empty".to_string(),
            });
        }
        if self.token_cache_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "token_cache_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// OpenAI API settings
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub max_retries: u32,
    pub embedding_batch_size: usize,
    pub request_timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            temperature: 0.2,
            max_retries: 6,
            embedding_batch_size: 512,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl OpenAiConfig {
    pub fn from_env(missing: &mut Vec<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: env_required("OPENAI_API_KEY", missing),
            base_url: env::var("OPENAI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            chat_model: env::var("OPENAI_CHAT_MODEL").unwrap_or(defaults.chat_model),
            embedding_model: env::var("OPENAI_EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            temperature: env_parse("OPENAI_TEMPERATURE").unwrap_or(defaults.temperature),
            max_retries: env_parse("OPENAI_MAX_RETRIES").unwrap_or(defaults.max_retries),
            embedding_batch_size: env_parse("OPENAI_EMBEDDING_BATCH_SIZE")
                .unwrap_or(defaults.embedding_batch_size),
            request_timeout: env_parse("OPENAI_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                name: "OPENAI_TEMPERATURE".to_string(),
                reason: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        if self.embedding_batch_size == 0 || self.embedding_batch_size > 2048 {
            return Err(ConfigError::InvalidValue {
                name: "OPENAI_EMBEDDING_BATCH_SIZE".to_string(),
                reason: "must be between 1 and 2048".to_string(),
            });
        }
        if self.chat_model.trim().is_empty() || self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "OPENAI_CHAT_MODEL".to_string(),
                reason: "model names cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
