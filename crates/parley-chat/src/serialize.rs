// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tagged JSON forms for threads and channels, and the reviver that turns
//! tagged objects in arbitrary JSON back into live values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use parley_core::message::SerializedMessage;
use parley_core::{ChatError, Message};

use crate::channel::Channel;
use crate::chat::Chat;
use crate::thread::Thread;

const THREAD_TAG: &str = "chat:Thread";
const CHANNEL_TAG: &str = "chat:Channel";
const MESSAGE_TAG: &str = "chat:Message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadTag {
    #[serde(rename = "chat:Thread")]
    Thread,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelTag {
    #[serde(rename = "chat:Channel")]
    Channel,
}

/// Plain JSON form of a [`Thread`]. Carries no adapter instance and no
/// cached messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedThread {
    #[serde(rename = "_type")]
    pub tag: ThreadTag,
    pub id: String,
    #[serde(rename = "channelId")]
    pub channel_id: String,
    #[serde(rename = "isDM", default)]
    pub is_dm: bool,
    #[serde(rename = "adapterName")]
    pub adapter_name: String,
}

/// Plain JSON form of a [`Channel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedChannel {
    #[serde(rename = "_type")]
    pub tag: ChannelTag,
    pub id: String,
    #[serde(rename = "adapterName")]
    pub adapter_name: String,
    #[serde(rename = "isDM", default)]
    pub is_dm: bool,
}

/// A JSON tree with tagged objects replaced by live values.
#[derive(Debug, Clone)]
pub enum Revived {
    Thread(Thread),
    Channel(Channel),
    Message(Message),
    Array(Vec<Revived>),
    Object(BTreeMap<String, Revived>),
    Value(serde_json::Value),
}

impl Revived {
    pub fn as_thread(&self) -> Option<&Thread> {
        match self {
            Revived::Thread(thread) => Some(thread),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            Revived::Channel(channel) => Some(channel),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Revived::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Revived::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Member of an object node.
    pub fn get(&self, key: &str) -> Option<&Revived> {
        match self {
            Revived::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Element of an array node.
    pub fn index(&self, index: usize) -> Option<&Revived> {
        match self {
            Revived::Array(items) => items.get(index),
            _ => None,
        }
    }
}

/// Rebuilds live threads, channels and messages bound to one [`Chat`].
#[derive(Clone)]
pub struct Reviver {
    chat: Chat,
}

impl Reviver {
    pub(crate) fn new(chat: Chat) -> Self {
        Self { chat }
    }

    pub fn revive(&self, value: serde_json::Value) -> Result<Revived, ChatError> {
        match value {
            serde_json::Value::Object(map) => {
                let tag = map.get("_type").and_then(|t| t.as_str()).map(str::to_owned);
                match tag.as_deref() {
                    Some(THREAD_TAG) => {
                        let serialized: SerializedThread =
                            serde_json::from_value(serde_json::Value::Object(map))?;
                        Ok(Revived::Thread(Thread::from_json_with(serialized, &self.chat)?))
                    }
                    Some(CHANNEL_TAG) => {
                        let serialized: SerializedChannel =
                            serde_json::from_value(serde_json::Value::Object(map))?;
                        Ok(Revived::Channel(Channel::from_json_with(
                            serialized, &self.chat,
                        )?))
                    }
                    Some(MESSAGE_TAG) => {
                        let serialized: SerializedMessage =
                            serde_json::from_value(serde_json::Value::Object(map))?;
                        Ok(Revived::Message(Message::from_json(serialized)))
                    }
                    _ => map
                        .into_iter()
                        .map(|(key, value)| Ok((key, self.revive(value)?)))
                        .collect::<Result<BTreeMap<_, _>, ChatError>>()
                        .map(Revived::Object),
                }
            }
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| self.revive(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Revived::Array),
            other => Ok(Revived::Value(other)),
        }
    }
}

impl std::fmt::Debug for Reviver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reviver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn thread_form_uses_wire_names() {
        let serialized = SerializedThread {
            tag: ThreadTag::Thread,
            id: "slack:C1:t1".into(),
            channel_id: "slack:C1".into(),
            is_dm: false,
            adapter_name: "slack".into(),
        };
        assert_eq!(
            serde_json::to_value(&serialized).unwrap(),
            json!({
                "_type": "chat:Thread",
                "id": "slack:C1:t1",
                "channelId": "slack:C1",
                "isDM": false,
                "adapterName": "slack",
            })
        );
    }

    #[test]
    fn wrong_tag_is_rejected() {
        let err = serde_json::from_value::<SerializedChannel>(json!({
            "_type": "chat:Thread",
            "id": "slack:C1",
            "adapterName": "slack",
        }));
        assert!(err.is_err());
    }
}
