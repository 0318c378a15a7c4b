// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized non-message events produced by adapters.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::ChatError;
use crate::message::Message;
use crate::postable::ModalElement;
use crate::types::{Author, EmojiValue};

/// Registers a background task so the webhook response can return before
/// processing finishes (serverless `waitUntil`).
pub type WaitUntil = Arc<dyn Fn(BoxFuture<'static, ()>) + Send + Sync>;

/// Options threaded from the webhook entry point into `process_*` calls.
#[derive(Clone, Default)]
pub struct WebhookOptions {
    pub wait_until: Option<WaitUntil>,
}

impl WebhookOptions {
    pub fn with_wait_until(wait_until: WaitUntil) -> Self {
        Self {
            wait_until: Some(wait_until),
        }
    }
}

impl std::fmt::Debug for WebhookOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookOptions")
            .field("wait_until", &self.wait_until.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A message that is either already parsed or produced lazily inside the
/// processing task.
pub enum MessageSource {
    Ready(Message),
    Deferred(BoxFuture<'static, Result<Message, ChatError>>),
}

impl MessageSource {
    pub async fn resolve(self) -> Result<Message, ChatError> {
        match self {
            MessageSource::Ready(message) => Ok(message),
            MessageSource::Deferred(factory) => factory.await,
        }
    }
}

impl From<Message> for MessageSource {
    fn from(message: Message) -> Self {
        MessageSource::Ready(message)
    }
}

/// A reaction added to or removed from a message.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    /// Normalized emoji.
    pub emoji: EmojiValue,
    /// The platform's own spelling (`+1`, `👍`, ...).
    pub raw_emoji: String,
    pub added: bool,
    pub user: Author,
    pub message_id: String,
    pub thread_id: String,
    /// The reacted-to message, when the adapter has it at hand.
    pub message: Option<Message>,
    pub raw: serde_json::Value,
}

/// A button or select interaction.
#[derive(Debug, Clone)]
pub struct ActionEvent {
    pub action_id: String,
    pub value: Option<String>,
    pub user: Author,
    pub message_id: String,
    pub thread_id: String,
    /// Required by platforms that only open modals in response to a trigger.
    pub trigger_id: Option<String>,
    /// The message carrying the interactive element, when the payload has it.
    pub message: Option<Message>,
    pub raw: serde_json::Value,
}

/// A modal form submission.
#[derive(Debug, Clone)]
pub struct ModalSubmitEvent {
    pub callback_id: String,
    pub view_id: String,
    pub values: HashMap<String, String>,
    pub user: Author,
    pub private_metadata: Option<String>,
    /// Context ID handed to `open_modal`, echoed back by the adapter.
    pub context_id: Option<String>,
    pub raw: serde_json::Value,
}

/// A modal dismissed without submitting.
#[derive(Debug, Clone)]
pub struct ModalCloseEvent {
    pub callback_id: String,
    pub view_id: String,
    pub user: Author,
    pub private_metadata: Option<String>,
    pub context_id: Option<String>,
    pub raw: serde_json::Value,
}

/// Synchronous answer to a modal submission.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalResponse {
    Close,
    /// Field-level validation errors keyed by input ID.
    Errors(HashMap<String, String>),
    Update(ModalElement),
    Push(ModalElement),
}

/// Returned when the adapter opened a modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalOpened {
    pub view_id: String,
}
