// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prefixed, level-gated logger forwarding to `tracing`.
//!
//! The dispatcher owns one [`Logger`]; adapters receive children from
//! `Chat::logger(prefix)`. A logger at [`LogLevel::Silent`] emits nothing,
//! independent of the installed subscriber.

use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Minimum level a [`Logger`] emits.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Silent,
}

#[derive(Debug, Clone)]
pub struct Logger {
    prefix: Arc<str>,
    level: LogLevel,
}

impl Logger {
    pub fn new(prefix: impl AsRef<str>, level: LogLevel) -> Self {
        Self {
            prefix: Arc::from(prefix.as_ref()),
            level,
        }
    }

    /// A logger that drops everything.
    pub fn silent() -> Self {
        Self::new("", LogLevel::Silent)
    }

    /// Returns a logger whose prefix is `"<parent>:<prefix>"`.
    pub fn child(&self, prefix: &str) -> Self {
        let prefix = if self.prefix.is_empty() {
            prefix.to_string()
        } else {
            format!("{}:{prefix}", self.prefix)
        };
        Self::new(prefix, self.level)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.level != LogLevel::Silent && level != LogLevel::Silent && level >= self.level
    }

    pub fn debug(&self, message: impl Display) {
        if self.enabled(LogLevel::Debug) {
            tracing::debug!(logger = %self.prefix, "{message}");
        }
    }

    pub fn info(&self, message: impl Display) {
        if self.enabled(LogLevel::Info) {
            tracing::info!(logger = %self.prefix, "{message}");
        }
    }

    pub fn warn(&self, message: impl Display) {
        if self.enabled(LogLevel::Warn) {
            tracing::warn!(logger = %self.prefix, "{message}");
        }
    }

    pub fn error(&self, message: impl Display) {
        if self.enabled(LogLevel::Error) {
            tracing::error!(logger = %self.prefix, "{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!(LogLevel::from_str("WARN").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("silent").unwrap(), LogLevel::Silent);
        assert!(LogLevel::from_str("verbose").is_err());
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }

    #[test]
    fn threshold_filters_lower_levels() {
        let logger = Logger::new("chat", LogLevel::Warn);
        assert!(!logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Warn));
        assert!(logger.enabled(LogLevel::Error));
        assert!(!Logger::silent().enabled(LogLevel::Error));
    }

    #[test]
    fn child_prefixes_nest() {
        let logger = Logger::new("chat", LogLevel::Debug);
        assert_eq!(logger.child("slack").prefix(), "chat:slack");
        assert_eq!(Logger::new("", LogLevel::Debug).child("slack").prefix(), "slack");
    }

    #[traced_test]
    #[test]
    fn silent_logger_emits_nothing() {
        Logger::silent().error("should never appear");
        Logger::new("chat", LogLevel::Info).warn("visible warning");
        assert!(!logs_contain("should never appear"));
        assert!(logs_contain("visible warning"));
    }
}
