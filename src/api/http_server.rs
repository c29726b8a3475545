// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::auth_callback::auth_callback_handler;
use super::chat::{
    ask_handler, clear_session_handler, history_handler, init_handler, legacy_ask_handler,
    legacy_init_handler, locate_handler,
};
use super::documents::{delete_document_handler, list_documents_handler};
use super::health::health_handler;
use super::rate_limiter::AskRateLimiter;
use super::route_guard::route_guard;
use super::storage::signed_url_handler;
use super::upload::upload_handler;
use crate::config::AppConfig;
use crate::llm::{ChatModel, EmbeddingProvider};
use crate::rag::{ChatSessionStore, RagPipeline, SessionStoreConfig};
use crate::supabase::{AuthVerifier, DocumentRepository, ObjectStorage};

/// Multipart framing overhead allowed on top of the PDF size limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<dyn AuthVerifier>,
    pub storage: Arc<dyn ObjectStorage>,
    pub documents: Arc<dyn DocumentRepository>,
    pub sessions: Arc<ChatSessionStore>,
    pub pipeline: RagPipeline,
    pub ask_limiter: AskRateLimiter,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        auth: Arc<dyn AuthVerifier>,
        storage: Arc<dyn ObjectStorage>,
        documents: Arc<dyn DocumentRepository>,
        embeddings: Arc<dyn EmbeddingProvider>,
        chat_model: Arc<dyn ChatModel>,
    ) -> Self {
        let sessions = Arc::new(ChatSessionStore::new(SessionStoreConfig {
            max_sessions: config.rag.max_sessions,
            idle_timeout: config.rag.session_idle_timeout,
        }));
        let pipeline = RagPipeline::new(embeddings, chat_model, config.rag.clone());
        let ask_limiter = AskRateLimiter::new(config.rag.ask_rate_per_minute);
        Self {
            config: Arc::new(config),
            auth,
            storage,
            documents,
            sessions,
            pipeline,
            ask_limiter,
        }
    }

    /// Bucket holding uploaded PDFs
    pub fn bucket(&self) -> &str {
        &self.config.supabase.storage_bucket
    }
}

pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/upload", post(upload_handler))
        .route(
            "/api/pdfs",
            get(list_documents_handler).delete(delete_document_handler),
        )
        .route(
            "/api/pdfs/delete",
            axum::routing::delete(delete_document_handler),
        )
        .route("/api/storage/get-signed-url", post(signed_url_handler))
        .route("/api/chat/init", post(init_handler))
        .route("/api/chat/ask", post(ask_handler))
        .route(
            "/api/chat",
            post(legacy_ask_handler)
                .put(legacy_init_handler)
                .delete(clear_session_handler),
        )
        .route("/api/chat/history", get(history_handler))
        .route("/api/chat/locate", post(locate_handler));

    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/callback", get(auth_callback_handler))
        .merge(api);

    if let Some(dir) = &state.config.server.static_dir {
        info!("Serving frontend bundle from {}", dir.display());
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    let body_limit = state.config.upload.max_bytes + MULTIPART_OVERHEAD;
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    app.layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Bind the configured address and serve until `shutdown` resolves
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = state.config.server.listen_addr.parse::<SocketAddr>()?;
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
