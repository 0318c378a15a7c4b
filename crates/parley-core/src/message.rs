// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The normalized chat message and its tagged JSON form.
//!
//! A [`Message`] is built by an adapter from a platform payload and is the
//! canonical value every handler receives. [`Message::to_json`] produces a
//! [`SerializedMessage`] tagged `"_type": "chat:Message"` that can cross a
//! process or workflow-engine boundary; [`Message::from_json`] is its exact
//! inverse (dates survive with millisecond precision).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Attachment, Author, MessageMetadata};

/// One chat message, normalized across platforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SerializedMessage", from = "SerializedMessage")]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    /// Plain-text rendering of the message.
    pub text: String,
    /// Markdown AST produced by the adapter's formatter.
    pub formatted: serde_json::Value,
    /// The untouched platform payload.
    pub raw: serde_json::Value,
    pub author: Author,
    pub metadata: MessageMetadata,
    pub attachments: Vec<Attachment>,
    /// Set by the adapter or, failing that, by the dispatcher's mention
    /// detection before any handler runs.
    pub is_mention: Option<bool>,
}

impl Message {
    /// Creates a message sent now, with empty formatting and payload.
    pub fn new(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        text: impl Into<String>,
        author: Author,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            text: text.into(),
            formatted: serde_json::Value::Null,
            raw: serde_json::Value::Null,
            author,
            metadata: MessageMetadata::sent_at(Utc::now()),
            attachments: Vec::new(),
            is_mention: None,
        }
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }

    pub fn with_formatted(mut self, formatted: serde_json::Value) -> Self {
        self.formatted = formatted;
        self
    }

    pub fn with_date_sent(mut self, date_sent: DateTime<Utc>) -> Self {
        self.metadata.date_sent = date_sent;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_mention(mut self, is_mention: bool) -> Self {
        self.is_mention = Some(is_mention);
        self
    }

    /// Returns the mention flag, treating "not yet detected" as false.
    pub fn mentions_bot(&self) -> bool {
        self.is_mention.unwrap_or(false)
    }

    pub fn to_json(&self) -> SerializedMessage {
        SerializedMessage::from(self.clone())
    }

    pub fn from_json(json: SerializedMessage) -> Self {
        Message::from(json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageTag {
    #[serde(rename = "chat:Message")]
    Message,
}

/// Plain JSON form of a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedMessage {
    #[serde(rename = "_type")]
    pub tag: MessageTag,
    pub id: String,
    pub thread_id: String,
    pub text: String,
    #[serde(default)]
    pub formatted: serde_json::Value,
    #[serde(default)]
    pub raw: serde_json::Value,
    pub author: Author,
    pub metadata: MessageMetadata,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mention: Option<bool>,
}

impl From<Message> for SerializedMessage {
    fn from(message: Message) -> Self {
        Self {
            tag: MessageTag::Message,
            id: message.id,
            thread_id: message.thread_id,
            text: message.text,
            formatted: message.formatted,
            raw: message.raw,
            author: message.author,
            metadata: message.metadata,
            // Binary data and fetch closures are dropped by the serde skips.
            attachments: message
                .attachments
                .into_iter()
                .map(|mut a| {
                    a.data = None;
                    a.fetch_data = None;
                    a
                })
                .collect(),
            is_mention: message.is_mention,
        }
    }
}

impl From<SerializedMessage> for Message {
    fn from(json: SerializedMessage) -> Self {
        Self {
            id: json.id,
            thread_id: json.thread_id,
            text: json.text,
            formatted: json.formatted,
            raw: json.raw,
            author: json.author,
            metadata: json.metadata,
            attachments: json.attachments,
            is_mention: json.is_mention,
        }
    }
}
