// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley chat-bot SDK.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Dispatcher identity and timing settings.
    #[serde(default)]
    pub chat: ChatSettings,

    /// Webhook HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewaySettings,
}

/// Dispatcher settings, turned into a runtime `ChatConfig` by `parley-chat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatSettings {
    /// Default bot display name used for mention detection.
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Logging level (debug, info, warn, error, silent).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Minimum delay between edits of a fallback-streamed message.
    #[serde(default = "default_streaming_update_interval_ms")]
    pub streaming_update_interval_ms: u64,

    /// How long a processed message ID is remembered.
    #[serde(default = "default_dedupe_ttl_ms")]
    pub dedupe_ttl_ms: u64,

    /// TTL of the per-thread processing lock.
    #[serde(default = "default_lock_ttl_ms")]
    pub lock_ttl_ms: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            log_level: default_log_level(),
            streaming_update_interval_ms: default_streaming_update_interval_ms(),
            dedupe_ttl_ms: default_dedupe_ttl_ms(),
            lock_ttl_ms: default_lock_ttl_ms(),
        }
    }
}

fn default_user_name() -> String {
    "bot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_streaming_update_interval_ms() -> u64 {
    500
}

fn default_dedupe_ttl_ms() -> u64 {
    60_000
}

fn default_lock_ttl_ms() -> u64 {
    30_000
}

/// Webhook gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySettings {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted webhook body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ParleyConfig::default();
        assert_eq!(config.chat.user_name, "bot");
        assert_eq!(config.chat.log_level, "info");
        assert_eq!(config.chat.streaming_update_interval_ms, 500);
        assert_eq!(config.chat.dedupe_ttl_ms, 60_000);
        assert_eq!(config.chat.lock_ttl_ms, 30_000);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.gateway.max_body_bytes, 1_048_576);
    }

    #[test]
    fn empty_sections_fill_defaults() {
        let config: ParleyConfig = toml::from_str("[chat]\n[gateway]\n").unwrap();
        assert_eq!(config, ParleyConfig::default());
    }
}
