// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures: message builders and a `wait_until` collector that lets
//! tests await background processing deterministically.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use parley_core::events::{WaitUntil, WebhookOptions};
use parley_core::types::{Author, IsBot};
use parley_core::Message;

/// Collects the tasks a dispatcher registers through `wait_until`.
#[derive(Clone, Default)]
pub struct TaskCollector {
    tasks: Arc<Mutex<Vec<BoxFuture<'static, ()>>>>,
}

impl TaskCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wait_until(&self) -> WaitUntil {
        let tasks = Arc::clone(&self.tasks);
        Arc::new(move |task| {
            tasks.lock().unwrap_or_else(|e| e.into_inner()).push(task);
        })
    }

    /// Webhook options wired to this collector.
    pub fn options(&self) -> WebhookOptions {
        WebhookOptions::with_wait_until(self.wait_until())
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Awaits every collected task, including tasks registered while draining.
    pub async fn drain(&self) {
        loop {
            let batch: Vec<_> = {
                let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
                tasks.drain(..).collect()
            };
            if batch.is_empty() {
                return;
            }
            futures::future::join_all(batch).await;
        }
    }
}

/// A human author.
pub fn author(user_id: &str, user_name: &str) -> Author {
    Author {
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        full_name: user_name.to_string(),
        is_bot: IsBot::No,
        is_me: false,
    }
}

/// The bot itself, as adapters report its own messages.
pub fn bot_author() -> Author {
    Author {
        user_id: "BOT".to_string(),
        user_name: "bot".to_string(),
        full_name: "Bot".to_string(),
        is_bot: IsBot::Yes,
        is_me: true,
    }
}

/// A message from user `U1` ("alice").
pub fn user_message(id: &str, thread_id: &str, text: &str) -> Message {
    Message::new(id, thread_id, text, author("U1", "alice"))
}

/// A message the bot sent itself.
pub fn bot_message(id: &str, thread_id: &str, text: &str) -> Message {
    Message::new(id, thread_id, text, bot_author())
}
