// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./parley.toml` > `~/.config/parley/parley.toml` > `/etc/parley/parley.toml`
//! with environment variable overrides via `PARLEY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ParleyConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/parley/parley.toml` (system-wide)
/// 3. `~/.config/parley/parley.toml` (user XDG config)
/// 4. `./parley.toml` (local directory)
/// 5. `PARLEY_*` environment variables
pub fn load_config() -> Result<ParleyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file("/etc/parley/parley.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("parley/parley.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("parley.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `PARLEY_CHAT_USER_NAME`
/// must become `chat.user_name`, not `chat.user.name`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("PARLEY_").map(|key| {
        key.as_str()
            .replacen("chat_", "chat.", 1)
            .replacen("gateway_", "gateway.", 1)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PARLEY_CHAT_USER_NAME", "helper");
            jail.set_env("PARLEY_GATEWAY_PORT", "8080");
            jail.set_env("PARLEY_CHAT_LOCK_TTL_MS", "1000");
            let config: ParleyConfig = Figment::new()
                .merge(Serialized::defaults(ParleyConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.chat.user_name, "helper");
            assert_eq!(config.chat.lock_ttl_ms, 1000);
            assert_eq!(config.gateway.port, 8080);
            Ok(())
        });
    }

    #[test]
    fn local_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("parley.toml", "[chat]\nuser_name = \"local\"\n")?;
            let config = load_config_from_path(Path::new("parley.toml"))?;
            assert_eq!(config.chat.user_name, "local");
            assert_eq!(config.gateway.port, 3000);
            Ok(())
        });
    }
}
