// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley chat-bot SDK.

use std::time::Duration;

use thiserror::Error;

/// Boxed error type returned by user-registered handlers.
///
/// Handlers may fail with any error type; the dispatcher wraps the failure in
/// [`ChatError::Handler`] before logging it.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across the dispatcher, threads, channels, and
/// adapter traits.
///
/// Every variant carries a stable string code (see [`ChatError::code`]) so
/// bot code can branch on the failure kind without matching on messages.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The platform rejected the request because of rate limiting.
    #[error("rate limited{}", retry_after.map(|d| format!(", retry after {}ms", d.as_millis())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    /// The per-thread lock could not be acquired.
    #[error("failed to acquire lock on thread {thread_id}")]
    Lock { thread_id: String },

    /// The requested feature has no implementation yet.
    #[error("{}", match feature { Some(f) => format!("{f} is not implemented"), None => "not implemented".to_string() })]
    NotImplemented { feature: Option<String> },

    /// The adapter does not support the requested operation.
    #[error("adapter `{adapter}` does not support {feature}")]
    NotSupported { adapter: String, feature: String },

    /// A raw user ID could not be matched to any registered adapter.
    #[error(
        "cannot infer adapter from user id `{user_id}`; expected Slack (U...), Teams (29:...), Google Chat (users/...), or Discord (snowflake id)"
    )]
    UnknownUserIdFormat { user_id: String },

    /// No adapter with the given name is registered with the dispatcher.
    #[error("adapter not found: {name}")]
    AdapterNotFound { name: String },

    /// A lazily-constructed thread or channel was used before any dispatcher
    /// registered itself as the process-wide singleton.
    #[error("no chat singleton registered; call Chat::register_singleton() first")]
    SingletonMissing,

    /// A card, modal, or JSX element could not be converted.
    #[error("invalid element: {0}")]
    InvalidElement(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The state backend failed.
    #[error("state error: {message}")]
    State {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A platform adapter call failed.
    #[error("adapter error: {message}")]
    Adapter {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A user handler returned an error or panicked.
    #[error("handler failed: {source}")]
    Handler { source: HandlerError },

    /// Catch-all carrying an explicit code.
    #[error("{message}")]
    Other { code: String, message: String },
}

impl ChatError {
    /// Returns the stable machine-readable code for this error.
    pub fn code(&self) -> &str {
        match self {
            ChatError::RateLimited { .. } => "RATE_LIMITED",
            ChatError::Lock { .. } => "LOCK_FAILED",
            ChatError::NotImplemented { .. } => "NOT_IMPLEMENTED",
            ChatError::NotSupported { .. } => "NOT_SUPPORTED",
            ChatError::UnknownUserIdFormat { .. } => "UNKNOWN_USER_ID_FORMAT",
            ChatError::AdapterNotFound { .. } => "ADAPTER_NOT_FOUND",
            ChatError::SingletonMissing => "NO_SINGLETON",
            ChatError::InvalidElement(_) => "INVALID_ELEMENT",
            ChatError::Serialization(_) => "SERIALIZATION_ERROR",
            ChatError::State { .. } => "STATE_ERROR",
            ChatError::Adapter { .. } => "ADAPTER_ERROR",
            ChatError::Handler { .. } => "HANDLER_FAILED",
            ChatError::Other { code, .. } => code,
        }
    }

    /// Shorthand for [`ChatError::NotSupported`].
    pub fn not_supported(adapter: impl Into<String>, feature: impl Into<String>) -> Self {
        ChatError::NotSupported {
            adapter: adapter.into(),
            feature: feature.into(),
        }
    }

    /// Shorthand for a [`ChatError::State`] without an underlying source.
    pub fn state(message: impl Into<String>) -> Self {
        ChatError::State {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`ChatError::Adapter`] without an underlying source.
    pub fn adapter(message: impl Into<String>) -> Self {
        ChatError::Adapter {
            message: message.into(),
            source: None,
        }
    }
}

impl From<HandlerError> for ChatError {
    fn from(source: HandlerError) -> Self {
        ChatError::Handler { source }
    }
}
