// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration loaded from the environment

pub mod provider;
pub mod rag;

pub use provider::{OpenAiConfig, SupabaseConfig};
pub use rag::{RagConfig, UploadConfig};

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub cors_allowed_origins: Vec<String>,
    /// Prebuilt frontend bundle served behind the route guard
    pub static_dir: Option<PathBuf>,
    pub session_cleanup_interval_secs: u64,
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            static_dir: None,
            session_cleanup_interval_secs: 300,
            secure_cookies: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: env::var("PDFMATE_LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            cors_allowed_origins: env::var("PDFMATE_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_allowed_origins),
            static_dir: env::var("PDFMATE_STATIC_DIR").ok().map(PathBuf::from),
            session_cleanup_interval_secs: env_parse("PDFMATE_SESSION_CLEANUP_SECS")
                .unwrap_or(defaults.session_cleanup_interval_secs),
            secure_cookies: env::var("PDFMATE_SECURE_COOKIES")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.secure_cookies),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue {
                name: "PDFMATE_LISTEN_ADDR".to_string(),
                reason: format!("'{}' is not a socket address", self.listen_addr),
            });
        }
        if self.session_cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "PDFMATE_SESSION_CLEANUP_SECS".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub supabase: SupabaseConfig,
    pub openai: OpenAiConfig,
    pub rag: RagConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    /// Load `.env.local` and `.env` (if present), then read every section
    /// from the environment. Missing required variables are reported together.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();

        let mut missing = Vec::new();
        let supabase = SupabaseConfig::from_env(&mut missing);
        let openai = OpenAiConfig::from_env(&mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing));
        }

        let config = Self {
            server: ServerConfig::from_env(),
            supabase,
            openai,
            rag: RagConfig::from_env()?,
            upload: UploadConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.supabase.validate()?;
        self.openai.validate()?;
        self.rag.validate()?;
        self.upload.validate()?;
        Ok(())
    }
}

/// Parse an optional environment variable, ignoring unparsable values
pub(crate) fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Read a required variable, recording its name when absent or empty
pub(crate) fn env_required(name: &str, missing: &mut Vec<String>) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => {
            missing.push(name.to_string());
            String::new()
        }
    }
}
