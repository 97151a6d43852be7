//! Cachet Relay Server
//!
//! A lightweight WebSocket relay that moves end-to-end encrypted
//! envelopes between identities:
//!
//! 1. **Authentication**: bearer token in the `/ws?token=` query,
//!    verified before the upgrade; rejected connections never touch
//!    the registry.
//!
//! 2. **Presence**: identity → connection registry, broadcasting
//!    `friend:online` / `friend:offline` and greeting each new
//!    connection with the online snapshot.
//!
//! 3. **Routing**: validated envelopes are forwarded verbatim to the
//!    recipient's connection; envelopes to offline identities are
//!    dropped — no queueing, no retry.
//!
//! **Privacy**: the relay never sees plaintext. All E2E encryption
//! happens client-side — only opaque encrypted blobs pass through.

use std::sync::Arc;

use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod handler;
pub mod presence;
pub mod protocol;
pub mod router;

pub use presence::PresenceRegistry;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Port to listen on.
    pub port: u16,
    /// Shared secret for bearer-token verification.
    pub auth_secret: String,
    /// Upper bound on a single inbound WebSocket message.
    pub max_message_bytes: usize,
}

/// Shared application state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PresenceRegistry>,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            registry: Arc::new(PresenceRegistry::new()),
            config: Arc::new(config),
        }
    }
}

/// Build the relay's router: the WebSocket endpoint plus health and
/// stats probes.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Route Handlers ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: Option<String>,
}

/// WebSocket upgrade handler. Authenticates before upgrading: a bad or
/// missing token is answered with 401 and the transport never opens.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let token = query.token.unwrap_or_default();
    let now = chrono::Utc::now().timestamp();

    match auth::verify_token(&token, state.config.auth_secret.as_bytes(), now) {
        Ok(session) => {
            let registry = Arc::clone(&state.registry);
            ws.max_message_size(state.config.max_message_bytes)
                .on_upgrade(move |socket| handler::handle_socket(socket, registry, session))
                .into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "connection rejected at handshake");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "cachet-relay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Statistics endpoint.
async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "online_clients": state.registry.online_count(),
    }))
}
