// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messages the bot has posted, with follow-up operations bound to them.

use std::ops::Deref;
use std::sync::Arc;

use parley_core::postable::PostableMessage;
use parley_core::types::{Author, EmojiValue, IsBot, RawMessage};
use parley_core::{Adapter, ChatError, Message};

use crate::postable::{plain_text, resolve_static};

/// A posted message plus the adapter that can edit, delete, or react to it.
///
/// Operations target the thread and message IDs the adapter returned, which
/// may differ from the thread the caller originally posted to.
#[derive(Clone)]
pub struct SentMessage {
    message: Message,
    adapter: Arc<dyn Adapter>,
}

impl SentMessage {
    pub(crate) fn from_raw(adapter: Arc<dyn Adapter>, raw: RawMessage, text: String) -> Self {
        let author = bot_author(adapter.as_ref());
        let message = Message::new(raw.id, raw.thread_id, text, author).with_raw(raw.raw);
        Self { message, adapter }
    }

    /// Wraps an existing message (usually one the bot authored) so it can be
    /// edited or reacted to.
    pub fn from_message(adapter: Arc<dyn Adapter>, message: Message) -> Self {
        Self { message, adapter }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn into_message(self) -> Message {
        self.message
    }

    /// Replaces the message content and returns the updated message.
    pub async fn edit(
        &self,
        content: impl Into<PostableMessage> + Send,
    ) -> Result<SentMessage, ChatError> {
        let content = resolve_static(content.into(), "edit")?;
        let raw = self
            .adapter
            .edit_message(&self.message.thread_id, &self.message.id, &content)
            .await?;
        let text = plain_text(self.adapter.as_ref(), &content);
        Ok(Self::from_raw(Arc::clone(&self.adapter), raw, text))
    }

    pub async fn delete(&self) -> Result<(), ChatError> {
        self.adapter
            .delete_message(&self.message.thread_id, &self.message.id)
            .await
    }

    pub async fn add_reaction(&self, emoji: impl Into<EmojiValue>) -> Result<(), ChatError> {
        self.adapter
            .add_reaction(&self.message.thread_id, &self.message.id, &emoji.into())
            .await
    }

    pub async fn remove_reaction(&self, emoji: impl Into<EmojiValue>) -> Result<(), ChatError> {
        self.adapter
            .remove_reaction(&self.message.thread_id, &self.message.id, &emoji.into())
            .await
    }
}

impl Deref for SentMessage {
    type Target = Message;

    fn deref(&self) -> &Message {
        &self.message
    }
}

impl std::fmt::Debug for SentMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentMessage")
            .field("adapter", &self.adapter.name())
            .field("message", &self.message)
            .finish()
    }
}

fn bot_author(adapter: &dyn Adapter) -> Author {
    Author {
        user_id: adapter.bot_user_id().unwrap_or("self").to_string(),
        user_name: adapter.user_name().to_string(),
        full_name: adapter.user_name().to_string(),
        is_bot: IsBot::Yes,
        is_me: true,
    }
}
