// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! State adapter trait for pluggable persistence backends (Redis, memory, ...).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ChatError;
use crate::types::Lock;

/// Key-value store, distributed lock service, and subscription set.
///
/// The dispatcher relies on the backend for exactly-one-holder lock
/// semantics and per-key write ordering; it never layers its own
/// coordination on top.
#[async_trait]
pub trait StateAdapter: Send + Sync + 'static {
    async fn connect(&self) -> Result<(), ChatError>;

    async fn disconnect(&self) -> Result<(), ChatError>;

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, ChatError>;

    /// Stores `value`, expiring it after `ttl` when given.
    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), ChatError>;

    async fn delete(&self, key: &str) -> Result<(), ChatError>;

    /// Returns `None` when another holder owns an unexpired lock.
    async fn acquire_lock(&self, thread_id: &str, ttl: Duration) -> Result<Option<Lock>, ChatError>;

    async fn release_lock(&self, lock: &Lock) -> Result<(), ChatError>;

    /// Returns `false` when the lock was lost (expired or taken over).
    async fn extend_lock(&self, lock: &Lock, ttl: Duration) -> Result<bool, ChatError>;

    async fn subscribe(&self, thread_id: &str) -> Result<(), ChatError>;

    async fn unsubscribe(&self, thread_id: &str) -> Result<(), ChatError>;

    async fn is_subscribed(&self, thread_id: &str) -> Result<bool, ChatError>;
}

/// Typed access on top of the JSON-valued [`StateAdapter`].
#[async_trait]
pub trait StateAdapterExt {
    async fn get_as<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, ChatError>;

    async fn set_as<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), ChatError>;
}

#[async_trait]
impl<S: StateAdapter + ?Sized> StateAdapterExt for S {
    async fn get_as<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, ChatError> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn set_as<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), ChatError> {
        self.set(key, serde_json::to_value(value)?, ttl).await
    }
}
