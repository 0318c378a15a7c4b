// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`StateAdapter`] with TTLs measured on the tokio clock.
//!
//! Expiry uses [`tokio::time::Instant`], so tests running with paused time
//! can step past TTLs with `tokio::time::advance`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tokio::time::Instant;

use parley_core::types::Lock;
use parley_core::{ChatError, StateAdapter};

struct StoredValue {
    value: serde_json::Value,
    expires_at: Option<Instant>,
}

struct HeldLock {
    token: String,
    expires_at: Instant,
}

/// A process-local state backend for tests.
#[derive(Default)]
pub struct MemoryState {
    values: DashMap<String, StoredValue>,
    locks: DashMap<String, HeldLock>,
    subscriptions: DashSet<String>,
    ops: AtomicUsize,
    releases: AtomicUsize,
    deny_locks: AtomicBool,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of trait calls made so far.
    pub fn op_count(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Make `acquire_lock` report contention until switched back.
    pub fn set_deny_locks(&self, deny: bool) {
        self.deny_locks.store(deny, Ordering::SeqCst);
    }

    pub fn is_locked(&self, thread_id: &str) -> bool {
        self.locks
            .get(thread_id)
            .is_some_and(|held| held.expires_at > Instant::now())
    }

    fn tick(&self) {
        self.ops.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StateAdapter for MemoryState {
    async fn connect(&self) -> Result<(), ChatError> {
        self.tick();
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ChatError> {
        self.tick();
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, ChatError> {
        self.tick();
        let now = Instant::now();
        let found = self
            .values
            .get(key)
            .map(|entry| (entry.expires_at.is_none_or(|at| at > now), entry.value.clone()));
        match found {
            Some((true, value)) => Ok(Some(value)),
            Some((false, _)) => {
                self.values.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), ChatError> {
        self.tick();
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.values
            .insert(key.to_string(), StoredValue { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ChatError> {
        self.tick();
        self.values.remove(key);
        Ok(())
    }

    async fn acquire_lock(
        &self,
        thread_id: &str,
        ttl: Duration,
    ) -> Result<Option<Lock>, ChatError> {
        self.tick();
        if self.deny_locks.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let now = Instant::now();
        let token = uuid::Uuid::new_v4().to_string();
        match self.locks.entry(thread_id.to_string()) {
            Entry::Occupied(held) if held.get().expires_at > now => return Ok(None),
            Entry::Occupied(mut held) => {
                held.insert(HeldLock {
                    token: token.clone(),
                    expires_at: now + ttl,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(HeldLock {
                    token: token.clone(),
                    expires_at: now + ttl,
                });
            }
        }
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).map_err(|e| ChatError::state(e.to_string()))?;
        Ok(Some(Lock {
            thread_id: thread_id.to_string(),
            token,
            expires_at,
        }))
    }

    async fn release_lock(&self, lock: &Lock) -> Result<(), ChatError> {
        self.tick();
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.locks
            .remove_if(&lock.thread_id, |_, held| held.token == lock.token);
        Ok(())
    }

    async fn extend_lock(&self, lock: &Lock, ttl: Duration) -> Result<bool, ChatError> {
        self.tick();
        let now = Instant::now();
        match self.locks.get_mut(&lock.thread_id) {
            Some(mut held) if held.token == lock.token && held.expires_at > now => {
                held.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn subscribe(&self, thread_id: &str) -> Result<(), ChatError> {
        self.tick();
        self.subscriptions.insert(thread_id.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, thread_id: &str) -> Result<(), ChatError> {
        self.tick();
        self.subscriptions.remove(thread_id);
        Ok(())
    }

    async fn is_subscribed(&self, thread_id: &str) -> Result<bool, ChatError> {
        self.tick();
        Ok(self.subscriptions.contains(thread_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn values_expire_after_ttl() {
        let state = MemoryState::new();
        state
            .set("k", serde_json::json!(1), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(state.get("k").await.unwrap(), Some(serde_json::json!(1)));

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert_eq!(state.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn lock_has_one_holder_until_released_or_expired() {
        let state = MemoryState::new();
        let ttl = Duration::from_secs(30);
        let lock = state.acquire_lock("t1", ttl).await.unwrap().unwrap();
        assert!(state.acquire_lock("t1", ttl).await.unwrap().is_none());

        state.release_lock(&lock).await.unwrap();
        let second = state.acquire_lock("t1", ttl).await.unwrap().unwrap();
        assert_ne!(second.token, lock.token);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(!state.extend_lock(&second, ttl).await.unwrap());
        assert!(state.acquire_lock("t1", ttl).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn stale_release_keeps_new_holder() {
        let state = MemoryState::new();
        let ttl = Duration::from_secs(30);
        let stale = Lock {
            thread_id: "t1".into(),
            token: "stale".into(),
            expires_at: Utc::now(),
        };
        state.acquire_lock("t1", ttl).await.unwrap().unwrap();
        state.release_lock(&stale).await.unwrap();
        assert!(state.is_locked("t1"));
    }

    #[tokio::test]
    async fn subscriptions_and_op_counting() {
        let state = MemoryState::new();
        state.subscribe("t1").await.unwrap();
        assert!(state.is_subscribed("t1").await.unwrap());
        state.unsubscribe("t1").await.unwrap();
        assert!(!state.is_subscribed("t1").await.unwrap());
        assert_eq!(state.op_count(), 4);
    }
}
