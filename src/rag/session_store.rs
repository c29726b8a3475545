// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-memory registry of chat sessions
//!
//! Sessions live for the lifetime of the process and are keyed by an id the
//! client sends with every question. Each session belongs to the user that
//! created it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::errors::RagError;
use super::service::{HistoryEntry, PdfChatSession, RagPipeline};
use crate::pdf::ParsedPdf;

const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            idle_timeout: Duration::from_secs(7200),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetrics {
    pub total_sessions: usize,
    /// Sessions not busy answering when the metrics were taken
    pub idle_sessions: usize,
    pub total_messages: usize,
    pub total_chunks: usize,
}

/// A registered session and its bookkeeping
pub struct SessionEntry {
    owner_id: String,
    file_id: Option<String>,
    created_at: Instant,
    last_active: Mutex<Instant>,
    session: AsyncMutex<PdfChatSession>,
}

impl SessionEntry {
    fn new(owner_id: String, file_id: Option<String>, session: PdfChatSession) -> Self {
        let now = Instant::now();
        Self {
            owner_id,
            file_id,
            created_at: now,
            last_active: Mutex::new(now),
            session: AsyncMutex::new(session),
        }
    }

    /// Exclusive access to the session; questions in one session run in order
    pub async fn lock(&self) -> MutexGuard<'_, PdfChatSession> {
        self.touch();
        self.session.lock().await
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .map(|t| t.elapsed())
            .unwrap_or_else(|poisoned| poisoned.into_inner().elapsed())
    }

    fn touch(&self) {
        let mut last_active = self
            .last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last_active = Instant::now();
    }
}

pub struct ChatSessionStore {
    config: SessionStoreConfig,
    sessions: RwLock<HashMap<String, Arc<SessionEntry>>>,
}

impl ChatSessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Parse, embed and register a session for `parsed`.
    ///
    /// Without `session_id` a UUID v4 is generated. An existing session with
    /// the same id is replaced only when it belongs to `owner_id`.
    pub async fn create(
        &self,
        session_id: Option<&str>,
        owner_id: &str,
        file_id: Option<&str>,
        parsed: &ParsedPdf,
        pipeline: &RagPipeline,
    ) -> Result<String, RagError> {
        let session_id = self.reserve_id(session_id, owner_id).await?;
        let session = pipeline.create_session(&session_id, parsed).await?;
        self.insert(
            session_id.clone(),
            owner_id,
            file_id.map(str::to_string),
            session,
        )
        .await?;
        Ok(session_id)
    }

    /// Validate a requested id (or generate one) and check it is free or
    /// already owned by `owner_id`.
    pub async fn reserve_id(
        &self,
        requested: Option<&str>,
        owner_id: &str,
    ) -> Result<String, RagError> {
        let session_id = match requested.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => {
                validate_session_id(id)?;
                id.to_string()
            }
            None => Self::generate_id(),
        };

        let sessions = self.sessions.read().await;
        if let Some(existing) = sessions.get(&session_id) {
            if existing.owner_id != owner_id {
                return Err(RagError::SessionOwnerMismatch(session_id));
            }
        }
        Ok(session_id)
    }

    /// Register an initialized session
    pub async fn insert(
        &self,
        session_id: String,
        owner_id: &str,
        file_id: Option<String>,
        session: PdfChatSession,
    ) -> Result<(), RagError> {
        let mut sessions = self.sessions.write().await;

        match sessions.get(&session_id) {
            Some(existing) if existing.owner_id != owner_id => {
                return Err(RagError::SessionOwnerMismatch(session_id));
            }
            Some(_) => debug!("Replacing session {}", session_id),
            None => {
                if sessions.len() >= self.config.max_sessions {
                    let removed = purge_idle(&mut sessions, self.config.idle_timeout);
                    if removed > 0 {
                        info!("Purged {} idle sessions to make room", removed);
                    }
                }
                if sessions.len() >= self.config.max_sessions {
                    warn!(
                        "Session limit reached ({}), rejecting {}",
                        self.config.max_sessions, session_id
                    );
                    return Err(RagError::SessionLimitReached {
                        max: self.config.max_sessions,
                    });
                }
            }
        }

        sessions.insert(
            session_id,
            Arc::new(SessionEntry::new(owner_id.to_string(), file_id, session)),
        );
        Ok(())
    }

    /// Session `session_id` if it exists and belongs to `owner_id`
    pub async fn get(&self, session_id: &str, owner_id: &str) -> Result<Arc<SessionEntry>, RagError> {
        let sessions = self.sessions.read().await;
        let entry = sessions
            .get(session_id)
            .ok_or_else(|| RagError::SessionNotFound(session_id.to_string()))?;
        if entry.owner_id != owner_id {
            return Err(RagError::SessionOwnerMismatch(session_id.to_string()));
        }
        entry.touch();
        Ok(entry.clone())
    }

    /// Drop a session; `Ok(false)` when it did not exist
    pub async fn remove(&self, session_id: &str, owner_id: &str) -> Result<bool, RagError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(session_id) {
            None => Ok(false),
            Some(entry) if entry.owner_id != owner_id => {
                Err(RagError::SessionOwnerMismatch(session_id.to_string()))
            }
            Some(_) => {
                sessions.remove(session_id);
                info!("Session {} removed", session_id);
                Ok(true)
            }
        }
    }

    /// Drop every session of `owner_id` built from `file_id`
    pub async fn remove_for_file(&self, owner_id: &str, file_id: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            !(entry.owner_id == owner_id && entry.file_id.as_deref() == Some(file_id))
        });
        before - sessions.len()
    }

    /// Conversation of a session; empty when the session does not exist
    pub async fn history(
        &self,
        session_id: &str,
        owner_id: &str,
    ) -> Result<Vec<HistoryEntry>, RagError> {
        match self.get(session_id, owner_id).await {
            Ok(entry) => {
                let session = entry.lock().await;
                Ok(session.history())
            }
            Err(RagError::SessionNotFound(_)) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove sessions idle for longer than the configured timeout
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        purge_idle(&mut sessions, self.config.idle_timeout)
    }

    pub async fn metrics(&self) -> StoreMetrics {
        let sessions = self.sessions.read().await;
        let mut metrics = StoreMetrics {
            total_sessions: sessions.len(),
            idle_sessions: 0,
            total_messages: 0,
            total_chunks: 0,
        };
        for entry in sessions.values() {
            // Busy sessions are counted but not inspected
            if let Ok(session) = entry.session.try_lock() {
                metrics.idle_sessions += 1;
                metrics.total_messages += session.message_count();
                metrics.total_chunks += session.chunk_count();
            }
        }
        metrics
    }

    /// Periodically purge idle sessions
    pub fn spawn_cleanup_task(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = self.cleanup_expired().await;
                if removed > 0 {
                    info!("Cleaned up {} idle chat sessions", removed);
                }
            }
        })
    }
}

fn purge_idle(sessions: &mut HashMap<String, Arc<SessionEntry>>, idle_timeout: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| entry.idle_for() <= idle_timeout);
    before - sessions.len()
}

fn validate_session_id(id: &str) -> Result<(), RagError> {
    if id.len() > MAX_SESSION_ID_LEN {
        return Err(RagError::InvalidSessionId(format!(
            "longer than {} characters",
            MAX_SESSION_ID_LEN
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RagError::InvalidSessionId(format!(
            "'{}' may only contain letters, digits, '-' and '_'",
            id
        )));
    }
    Ok(())
}
