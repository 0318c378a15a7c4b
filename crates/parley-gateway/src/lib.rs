// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP gateway for the Parley chat-bot SDK.
//!
//! Exposes every registered adapter's webhook at `POST /webhooks/{adapter}`
//! and a `GET /health` probe. Background processing started by a webhook is
//! tracked so [`serve`] can drain it before returning.

pub mod handlers;
pub mod logging;
pub mod server;
pub mod shutdown;

pub use logging::init_tracing;
pub use server::{GatewayState, router, serve, serve_listener};
pub use shutdown::install_signal_handler;

/// Errors raised while running the gateway server.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to bind gateway to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("gateway server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    Chat(#[from] parley_core::ChatError),
}
