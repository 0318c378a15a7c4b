// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::str::FromStr;

use parley_core::LogLevel;

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Validates semantic constraints serde cannot express.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let chat = &config.chat;

    if chat.user_name.trim().is_empty() {
        errors.push(ConfigError::validation("chat.user_name must not be empty"));
    }

    if LogLevel::from_str(&chat.log_level).is_err() {
        errors.push(ConfigError::validation(format!(
            "chat.log_level `{}` must be one of debug, info, warn, error, silent",
            chat.log_level
        )));
    }

    for (key, value) in [
        ("chat.streaming_update_interval_ms", chat.streaming_update_interval_ms),
        ("chat.dedupe_ttl_ms", chat.dedupe_ttl_ms),
        ("chat.lock_ttl_ms", chat.lock_ttl_ms),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!("{key} must be positive")));
        }
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.gateway.max_body_bytes == 0 {
        errors.push(ConfigError::validation(
            "gateway.max_body_bytes must be positive",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
