// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channels: the containers threads live in.

use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use parley_core::postable::{AdapterPostableMessage, PostableMessage};
use parley_core::types::{
    ChannelInfo, EphemeralMessage, FetchDirection, FetchOptions, ListThreadsOptions,
    ThreadSummary, UserRef,
};
use parley_core::{Adapter, ChatError};

use crate::chat::Chat;
use crate::postable::{
    Binding, EphemeralOptions, MessageStream, Postable, Resolved, SetStateOptions, load_state,
    merge_state, paginate, plain_text, post_ephemeral_via, resolve,
};
use crate::sent::SentMessage;
use crate::serialize::{ChannelTag, SerializedChannel};
use crate::singleton;

pub(crate) fn state_key(channel_id: &str) -> String {
    format!("channel-state:{channel_id}")
}

/// A stream of thread summaries, most recently active first.
pub type ThreadStream = BoxStream<'static, Result<ThreadSummary, ChatError>>;

/// A channel on one platform.
///
/// Like [`Thread`](crate::Thread), a channel rebuilt from JSON binds to its
/// adapter through the registered singleton on first use.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    id: String,
    adapter_name: String,
    is_dm: bool,
    name: Mutex<Option<String>>,
    binding: OnceLock<Binding>,
}

impl Channel {
    pub(crate) fn bound(binding: Binding, id: &str, is_dm: bool) -> Self {
        let adapter_name = binding.adapter.name().to_string();
        Self {
            inner: Arc::new(ChannelInner {
                id: id.to_string(),
                adapter_name,
                is_dm,
                name: Mutex::new(None),
                binding: OnceLock::from(binding),
            }),
        }
    }

    fn unbound(serialized: SerializedChannel, binding: Option<Binding>) -> Self {
        let cell = OnceLock::new();
        if let Some(binding) = binding {
            let _ = cell.set(binding);
        }
        Self {
            inner: Arc::new(ChannelInner {
                id: serialized.id,
                adapter_name: serialized.adapter_name,
                is_dm: serialized.is_dm,
                name: Mutex::new(None),
                binding: cell,
            }),
        }
    }

    pub fn from_json(serialized: SerializedChannel) -> Self {
        Self::unbound(serialized, None)
    }

    pub fn from_json_with(serialized: SerializedChannel, chat: &Chat) -> Result<Self, ChatError> {
        let binding = chat.binding(&serialized.adapter_name)?;
        Ok(Self::unbound(serialized, Some(binding)))
    }

    pub fn to_json(&self) -> SerializedChannel {
        SerializedChannel {
            tag: ChannelTag::Channel,
            id: self.inner.id.clone(),
            adapter_name: self.inner.adapter_name.clone(),
            is_dm: self.inner.is_dm,
        }
    }

    fn binding(&self) -> Result<&Binding, ChatError> {
        if let Some(binding) = self.inner.binding.get() {
            return Ok(binding);
        }
        let resolved = singleton::binding_for(&self.inner.adapter_name)?;
        Ok(self.inner.binding.get_or_init(|| resolved))
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn adapter_name(&self) -> &str {
        &self.inner.adapter_name
    }

    pub fn is_dm(&self) -> bool {
        self.inner.is_dm
    }

    /// Channel name, once [`Channel::fetch_metadata`] has seen one.
    pub fn name(&self) -> Option<String> {
        self.inner
            .name
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn adapter(&self) -> Result<Arc<dyn Adapter>, ChatError> {
        Ok(Arc::clone(&self.binding()?.adapter))
    }

    pub async fn state(&self) -> Result<Option<serde_json::Value>, ChatError> {
        load_state(self.binding()?.state.as_ref(), &state_key(&self.inner.id)).await
    }

    pub async fn set_state(
        &self,
        state: impl Serialize,
        options: SetStateOptions,
    ) -> Result<(), ChatError> {
        let value = serde_json::to_value(state)?;
        merge_state(
            self.binding()?.state.as_ref(),
            &state_key(&self.inner.id),
            value,
            options,
        )
        .await
    }

    /// Posts a top-level message.
    ///
    /// Channels do not stream: a stream is drained and posted once as
    /// markdown.
    pub async fn post(
        &self,
        message: impl Into<PostableMessage> + Send,
    ) -> Result<SentMessage, ChatError> {
        let message = match resolve(message.into())? {
            Resolved::Message(message) => message,
            Resolved::Stream(stream) => {
                let text: String = stream.try_collect().await?;
                AdapterPostableMessage::Markdown(text)
            }
        };
        let adapter = self.adapter()?;
        let raw = if adapter.capabilities().post_channel_message {
            adapter.post_channel_message(&self.inner.id, &message).await?
        } else {
            adapter.post_message(&self.inner.id, &message).await?
        };
        let text = plain_text(adapter.as_ref(), &message);
        Ok(SentMessage::from_raw(adapter, raw, text))
    }

    pub async fn post_ephemeral(
        &self,
        user: impl Into<UserRef> + Send,
        message: impl Into<PostableMessage> + Send,
        options: EphemeralOptions,
    ) -> Result<Option<EphemeralMessage>, ChatError> {
        let adapter = self.adapter()?;
        post_ephemeral_via(
            adapter.as_ref(),
            &self.inner.id,
            user.into(),
            message.into(),
            options,
        )
        .await
    }

    pub async fn start_typing(&self) -> Result<(), ChatError> {
        self.adapter()?.start_typing(&self.inner.id).await
    }

    pub fn mention_user(&self, user_id: &str) -> String {
        format!("<@{user_id}>")
    }

    /// Top-level messages newest first.
    pub fn messages(&self) -> MessageStream {
        let channel = self.clone();
        paginate(FetchDirection::Backward, move |cursor| {
            let channel = channel.clone();
            async move {
                let adapter = channel.adapter()?;
                let options = FetchOptions {
                    cursor,
                    direction: FetchDirection::Backward,
                    limit: None,
                };
                if adapter.capabilities().fetch_channel_messages {
                    adapter.fetch_channel_messages(channel.id(), options).await
                } else {
                    adapter.fetch_messages(channel.id(), options).await
                }
            }
        })
    }

    /// Threads in this channel. Empty when the adapter cannot list threads.
    pub fn threads(&self) -> ThreadStream {
        enum Cursor {
            Start,
            Next(String),
            Done,
        }

        let channel = self.clone();
        stream::try_unfold(Cursor::Start, move |cursor| {
            let channel = channel.clone();
            async move {
                let cursor = match cursor {
                    Cursor::Start => None,
                    Cursor::Next(cursor) => Some(cursor),
                    Cursor::Done => return Ok::<_, ChatError>(None),
                };
                let adapter = channel.adapter()?;
                if !adapter.capabilities().list_threads {
                    return Ok(None);
                }
                let page = adapter
                    .list_threads(channel.id(), ListThreadsOptions { cursor, limit: None })
                    .await?;
                let next = match page.next_cursor {
                    Some(cursor) if !page.threads.is_empty() => Cursor::Next(cursor),
                    _ => Cursor::Done,
                };
                let threads = stream::iter(page.threads.into_iter().map(Ok::<_, ChatError>));
                Ok(Some((threads, next)))
            }
        })
        .try_flatten()
        .boxed()
    }

    /// Fetches channel info, falling back to what is known locally when the
    /// adapter has no lookup. Caches the name.
    pub async fn fetch_metadata(&self) -> Result<ChannelInfo, ChatError> {
        let adapter = self.adapter()?;
        let info = if adapter.capabilities().fetch_channel_info {
            adapter.fetch_channel_info(&self.inner.id).await?
        } else {
            ChannelInfo {
                id: self.inner.id.clone(),
                name: None,
                is_dm: self.inner.is_dm,
                member_count: None,
                metadata: serde_json::json!({}),
            }
        };
        if let Some(name) = &info.name {
            *self.inner.name.lock().unwrap_or_else(|e| e.into_inner()) = Some(name.clone());
        }
        Ok(info)
    }
}

#[async_trait]
impl Postable for Channel {
    fn id(&self) -> &str {
        Channel::id(self)
    }

    fn adapter_name(&self) -> &str {
        Channel::adapter_name(self)
    }

    fn adapter(&self) -> Result<Arc<dyn Adapter>, ChatError> {
        Channel::adapter(self)
    }

    fn is_dm(&self) -> bool {
        Channel::is_dm(self)
    }

    async fn state(&self) -> Result<Option<serde_json::Value>, ChatError> {
        Channel::state(self).await
    }

    async fn set_state(
        &self,
        state: serde_json::Value,
        options: SetStateOptions,
    ) -> Result<(), ChatError> {
        Channel::set_state(self, state, options).await
    }

    async fn post(&self, message: PostableMessage) -> Result<SentMessage, ChatError> {
        Channel::post(self, message).await
    }

    async fn post_ephemeral(
        &self,
        user: UserRef,
        message: PostableMessage,
        options: EphemeralOptions,
    ) -> Result<Option<EphemeralMessage>, ChatError> {
        Channel::post_ephemeral(self, user, message, options).await
    }

    async fn start_typing(&self) -> Result<(), ChatError> {
        Channel::start_typing(self).await
    }

    fn messages(&self) -> MessageStream {
        Channel::messages(self)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.inner.id)
            .field("adapter", &self.inner.adapter_name)
            .field("is_dm", &self.inner.is_dm)
            .finish()
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        SerializedChannel::deserialize(deserializer).map(Channel::from_json)
    }
}
