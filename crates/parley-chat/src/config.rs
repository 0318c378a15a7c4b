// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime dispatcher configuration.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parley_config::model::ChatSettings;
use parley_core::{Adapter, ChatError, LogLevel, StateAdapter};

use crate::streaming::DEFAULT_UPDATE_INTERVAL;

/// Default lifetime of `dedupe:` records.
pub const DEFAULT_DEDUPE_TTL: Duration = Duration::from_secs(60);

/// Default TTL of the per-thread processing lock.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);

/// Everything needed to build a [`Chat`](crate::Chat).
///
/// Adapters are keyed by [`Adapter::name`]; registering a second adapter
/// with the same name replaces the first.
#[derive(Clone)]
pub struct ChatConfig {
    pub(crate) user_name: String,
    pub(crate) adapters: Vec<Arc<dyn Adapter>>,
    pub(crate) state: Arc<dyn StateAdapter>,
    pub(crate) log_level: LogLevel,
    pub(crate) streaming_update_interval: Duration,
    pub(crate) dedupe_ttl: Duration,
    pub(crate) lock_ttl: Duration,
}

impl ChatConfig {
    pub fn new(user_name: impl Into<String>, state: Arc<dyn StateAdapter>) -> Self {
        Self {
            user_name: user_name.into(),
            adapters: Vec::new(),
            state,
            log_level: LogLevel::default(),
            streaming_update_interval: DEFAULT_UPDATE_INTERVAL,
            dedupe_ttl: DEFAULT_DEDUPE_TTL,
            lock_ttl: DEFAULT_LOCK_TTL,
        }
    }

    /// Builds a config from the `[chat]` section of a loaded config file.
    pub fn from_settings(
        settings: &ChatSettings,
        state: Arc<dyn StateAdapter>,
    ) -> Result<Self, ChatError> {
        let log_level = LogLevel::from_str(&settings.log_level).map_err(|_| ChatError::Other {
            code: "INVALID_CONFIG".to_string(),
            message: format!("invalid log level: {}", settings.log_level),
        })?;
        Ok(Self::new(settings.user_name.clone(), state)
            .logger(log_level)
            .streaming_update_interval(Duration::from_millis(settings.streaming_update_interval_ms))
            .dedupe_ttl(Duration::from_millis(settings.dedupe_ttl_ms))
            .lock_ttl(Duration::from_millis(settings.lock_ttl_ms)))
    }

    pub fn adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Sets the dispatcher log level. [`LogLevel::Silent`] suppresses all output.
    pub fn logger(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn streaming_update_interval(mut self, interval: Duration) -> Self {
        self.streaming_update_interval = interval;
        self
    }

    pub fn dedupe_ttl(mut self, ttl: Duration) -> Self {
        self.dedupe_ttl = ttl;
        self
    }

    pub fn lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("user_name", &self.user_name)
            .field(
                "adapters",
                &self.adapters.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("log_level", &self.log_level)
            .field("streaming_update_interval", &self.streaming_update_interval)
            .field("dedupe_ttl", &self.dedupe_ttl)
            .field("lock_ttl", &self.lock_ttl)
            .finish_non_exhaustive()
    }
}
