// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state, and runs the listener until
//! the shutdown token fires.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;
use tracing::info;

use parley_chat::Chat;
use parley_config::GatewaySettings;

use crate::GatewayError;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub chat: Chat,
    /// Background processing spawned by webhooks.
    pub tasks: TaskTracker,
}

impl GatewayState {
    pub fn new(chat: Chat) -> Self {
        Self {
            chat,
            tasks: TaskTracker::new(),
        }
    }
}

/// Builds the gateway routes:
/// - POST /webhooks/{adapter}
/// - GET /health
pub fn router(state: GatewayState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/webhooks/{adapter}", post(handlers::post_webhook))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds to the configured host:port and serves until `shutdown` is cancelled.
pub async fn serve(
    settings: &GatewaySettings,
    chat: Chat,
    shutdown: CancellationToken,
) -> Result<(), GatewayError> {
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| GatewayError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("gateway listening on {addr}");
    serve_listener(listener, chat, settings.max_body_bytes, shutdown).await
}

/// Serves on an already bound listener.
///
/// After the token fires, in-flight requests finish, then webhook tasks are
/// drained and the dispatcher is shut down.
pub async fn serve_listener(
    listener: TcpListener,
    chat: Chat,
    max_body_bytes: usize,
    shutdown: CancellationToken,
) -> Result<(), GatewayError> {
    chat.initialize().await?;

    let state = GatewayState::new(chat.clone());
    let tasks = state.tasks.clone();

    axum::serve(listener, router(state, max_body_bytes))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(GatewayError::Serve)?;

    tasks.close();
    info!(pending = tasks.len(), "draining webhook tasks");
    tasks.wait().await;

    chat.shutdown().await?;
    info!("gateway stopped");
    Ok(())
}
