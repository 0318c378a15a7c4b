// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by adapters, the state backend, and the dispatcher.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::message::Message;

/// Whether a message author is a bot, as far as the platform can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsBot {
    Yes,
    #[default]
    No,
    /// The platform payload did not say.
    Unknown,
}

impl Serialize for IsBot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IsBot::Yes => serializer.serialize_bool(true),
            IsBot::No => serializer.serialize_bool(false),
            IsBot::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for IsBot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(true) => Ok(IsBot::Yes),
            Repr::Flag(false) => Ok(IsBot::No),
            Repr::Text(s) if s == "unknown" => Ok(IsBot::Unknown),
            Repr::Text(s) => Err(serde::de::Error::custom(format!(
                "expected boolean or \"unknown\", got \"{s}\""
            ))),
        }
    }
}

/// The author of a message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub user_id: String,
    pub user_name: String,
    pub full_name: String,
    pub is_bot: IsBot,
    /// Set by the adapter when the author is the bot itself.
    pub is_me: bool,
}

/// A reference to a user, either by raw platform ID or through an author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Id(String),
    Author(Author),
}

impl UserRef {
    pub fn user_id(&self) -> &str {
        match self {
            UserRef::Id(id) => id,
            UserRef::Author(author) => &author.user_id,
        }
    }
}

impl From<&str> for UserRef {
    fn from(id: &str) -> Self {
        UserRef::Id(id.to_string())
    }
}

impl From<String> for UserRef {
    fn from(id: String) -> Self {
        UserRef::Id(id)
    }
}

impl From<Author> for UserRef {
    fn from(author: Author) -> Self {
        UserRef::Author(author)
    }
}

impl From<&Author> for UserRef {
    fn from(author: &Author) -> Self {
        UserRef::Author(author.clone())
    }
}

/// Timing metadata attached to every message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(with = "iso_millis")]
    pub date_sent: DateTime<Utc>,
    pub edited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso_millis_opt")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl MessageMetadata {
    pub fn sent_at(date_sent: DateTime<Utc>) -> Self {
        Self {
            date_sent,
            edited: false,
            edited_at: None,
        }
    }
}

/// Kind of file attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
    Video,
    Audio,
}

/// Lazily downloads attachment bytes through the owning adapter.
pub type AttachmentFetcher =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<u8>, ChatError>> + Send + Sync>;

/// A file attached to a message.
///
/// `data` and `fetch_data` are process-local and never serialized.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip)]
    pub data: Option<bytes::Bytes>,
    #[serde(skip)]
    pub fetch_data: Option<AttachmentFetcher>,
}

impl Attachment {
    pub fn new(kind: AttachmentKind) -> Self {
        Self {
            kind,
            url: None,
            name: None,
            mime_type: None,
            size: None,
            width: None,
            height: None,
            data: None,
            fetch_data: None,
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data", &self.data.as_ref().map(|d| d.len()))
            .field("fetch_data", &self.fetch_data.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Compares the serializable fields only.
impl PartialEq for Attachment {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.url == other.url
            && self.name == other.name
            && self.mime_type == other.mime_type
            && self.size == other.size
            && self.width == other.width
            && self.height == other.height
    }
}

/// A normalized emoji name (`thumbs_up`, `eyes`, ...).
///
/// Platform-specific spellings travel alongside it as the raw emoji string of
/// a [`ReactionEvent`](crate::events::ReactionEvent).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmojiValue(Arc<str>);

impl EmojiValue {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EmojiValue {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for EmojiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A distributed lock on a single thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lock {
    pub thread_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Pagination direction for history fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchDirection {
    Forward,
    #[default]
    Backward,
}

/// Options for [`Adapter::fetch_messages`](crate::traits::Adapter::fetch_messages).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchOptions {
    pub cursor: Option<String>,
    pub direction: FetchDirection,
    pub limit: Option<usize>,
}

/// One page of messages. Pages are chronological (oldest first).
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub messages: Vec<Message>,
    pub next_cursor: Option<String>,
}

/// Identity returned by every outbound post or edit.
///
/// `thread_id` may differ from the thread the caller posted to when the
/// adapter created a thread lazily on first post.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub id: String,
    pub thread_id: String,
    pub raw: serde_json::Value,
}

/// Result of an ephemeral post.
#[derive(Debug, Clone, PartialEq)]
pub struct EphemeralMessage {
    pub id: String,
    pub thread_id: String,
    /// True when the platform lacked native ephemeral support and the message
    /// was delivered as a DM instead.
    pub used_fallback: bool,
    pub raw: serde_json::Value,
}

/// Thread metadata as reported by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadInfo {
    pub id: String,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub is_dm: bool,
    pub metadata: serde_json::Value,
}

/// Channel metadata as reported by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: Option<String>,
    pub is_dm: bool,
    pub member_count: Option<u64>,
    pub metadata: serde_json::Value,
}

/// Summary of one thread in a channel listing.
#[derive(Debug, Clone)]
pub struct ThreadSummary {
    pub id: String,
    pub root_message: Message,
    pub reply_count: Option<u64>,
    pub last_reply_at: Option<DateTime<Utc>>,
}

/// Options for [`Adapter::list_threads`](crate::traits::Adapter::list_threads).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListThreadsOptions {
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

/// One page of a channel's thread listing.
#[derive(Debug, Clone, Default)]
pub struct ListThreadsResult {
    pub threads: Vec<ThreadSummary>,
    pub next_cursor: Option<String>,
}

/// Hints passed to native streaming implementations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamOptions {
    pub recipient_user_id: Option<String>,
    pub recipient_team_id: Option<String>,
    /// Overrides the dispatcher-wide edit interval for fallback streaming.
    pub update_interval: Option<std::time::Duration>,
}

/// Optional features an adapter implements.
///
/// The dispatcher chooses native-vs-fallback behaviour from these flags; the
/// corresponding trait methods return [`ChatError::NotSupported`] by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdapterCapabilities {
    pub stream: bool,
    pub post_ephemeral: bool,
    pub open_dm: bool,
    pub open_modal: bool,
    pub post_channel_message: bool,
    pub fetch_channel_messages: bool,
    pub fetch_channel_info: bool,
    pub list_threads: bool,
    pub fetch_message: bool,
}

/// Serde helpers writing timestamps as ISO-8601 with millisecond precision.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|d| d.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Optional variant of [`iso_millis`].
pub mod iso_millis_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => super::iso_millis::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_bot_serializes_tri_state() {
        assert_eq!(serde_json::to_string(&IsBot::Yes).unwrap(), "true");
        assert_eq!(serde_json::to_string(&IsBot::No).unwrap(), "false");
        assert_eq!(serde_json::to_string(&IsBot::Unknown).unwrap(), "\"unknown\"");

        let parsed: IsBot = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(parsed, IsBot::Unknown);
        assert!(serde_json::from_str::<IsBot>("\"maybe\"").is_err());
    }

    #[test]
    fn author_uses_camel_case_keys() {
        let author = Author {
            user_id: "U1".into(),
            user_name: "alice".into(),
            full_name: "Alice A".into(),
            is_bot: IsBot::No,
            is_me: false,
        };
        let json = serde_json::to_value(&author).unwrap();
        assert_eq!(json["userId"], "U1");
        assert_eq!(json["isBot"], false);
        assert_eq!(json["isMe"], false);
    }

    #[test]
    fn user_ref_resolves_id() {
        let author = Author {
            user_id: "U42".into(),
            ..Author::default()
        };
        assert_eq!(UserRef::from(&author).user_id(), "U42");
        assert_eq!(UserRef::from("29:abc").user_id(), "29:abc");
    }

    #[test]
    fn attachment_equality_ignores_local_fields() {
        let mut a = Attachment::new(AttachmentKind::Image);
        a.url = Some("https://example.com/a.png".into());
        let mut b = a.clone();
        b.data = Some(bytes::Bytes::from_static(b"png"));
        assert_eq!(a, b);

        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["type"], "image");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn metadata_dates_are_millisecond_iso() {
        let date = DateTime::parse_from_rfc3339("2024-05-01T12:30:45.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_value(MessageMetadata::sent_at(date)).unwrap();
        assert_eq!(json["dateSent"], "2024-05-01T12:30:45.123Z");
        assert!(json.get("editedAt").is_none());
    }
}
