// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::rag::StoreMetrics;
use crate::version;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_sessions: usize,
    pub sessions: StoreMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let metrics = state.sessions.metrics().await;

    let mut issues = Vec::new();
    if metrics.total_sessions >= state.config.rag.max_sessions {
        issues.push("Chat session limit reached".to_string());
    }

    Json(HealthResponse {
        status: if issues.is_empty() { "healthy" } else { "degraded" }.to_string(),
        version: version::VERSION_NUMBER.to_string(),
        active_sessions: metrics.total_sessions,
        sessions: metrics,
        issues: if issues.is_empty() { None } else { Some(issues) },
    })
}
