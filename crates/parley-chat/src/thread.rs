// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A conversation thread nested in a channel.

use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use parley_core::postable::{PostableMessage, TextStream};
use parley_core::types::{
    EphemeralMessage, FetchDirection, FetchOptions, StreamOptions, UserRef,
};
use parley_core::{Adapter, ChatError, Message, derive_channel_id};

use crate::channel::Channel;
use crate::chat::Chat;
use crate::postable::{
    Binding, EphemeralOptions, MessageStream, Postable, Resolved, SetStateOptions, load_state,
    merge_state, paginate, plain_text, post_ephemeral_via, resolve,
};
use crate::sent::SentMessage;
use crate::serialize::{SerializedThread, ThreadTag};
use crate::{singleton, streaming};

/// Page size used by [`Thread::all_messages`].
const ALL_MESSAGES_PAGE: usize = 100;

/// Number of messages [`Thread::refresh`] keeps.
const RECENT_MESSAGES: usize = 50;

pub(crate) fn state_key(thread_id: &str) -> String {
    format!("thread-state:{thread_id}")
}

/// One conversation thread.
///
/// Cloning is cheap and clones share caches. A thread built by the
/// dispatcher is bound to its adapter immediately; one rebuilt with
/// [`Thread::from_json`] resolves its adapter from the registered singleton
/// on first use.
#[derive(Clone)]
pub struct Thread {
    inner: Arc<ThreadInner>,
}

struct ThreadInner {
    id: String,
    channel_id: String,
    is_dm: bool,
    adapter_name: String,
    binding: OnceLock<Binding>,
    is_subscribed_context: bool,
    current_message: Option<Message>,
    recent_messages: Mutex<Vec<Message>>,
    channel: OnceLock<Channel>,
}

/// Dispatcher-side construction options.
#[derive(Default)]
pub(crate) struct ThreadContext {
    pub is_subscribed: bool,
    pub current_message: Option<Message>,
}

impl Thread {
    pub(crate) fn bound(binding: Binding, id: &str, context: ThreadContext) -> Self {
        let adapter = binding.adapter.as_ref();
        let recent = context.current_message.iter().cloned().collect();
        Self {
            inner: Arc::new(ThreadInner {
                id: id.to_string(),
                channel_id: derive_channel_id(adapter, id),
                is_dm: adapter.is_dm(id),
                adapter_name: adapter.name().to_string(),
                binding: OnceLock::from(binding),
                is_subscribed_context: context.is_subscribed,
                current_message: context.current_message,
                recent_messages: Mutex::new(recent),
                channel: OnceLock::new(),
            }),
        }
    }

    pub(crate) fn restore(serialized: SerializedThread, binding: Option<Binding>) -> Self {
        let cell = OnceLock::new();
        if let Some(binding) = binding {
            let _ = cell.set(binding);
        }
        Self {
            inner: Arc::new(ThreadInner {
                id: serialized.id,
                channel_id: serialized.channel_id,
                is_dm: serialized.is_dm,
                adapter_name: serialized.adapter_name,
                binding: cell,
                is_subscribed_context: false,
                current_message: None,
                recent_messages: Mutex::new(Vec::new()),
                channel: OnceLock::new(),
            }),
        }
    }

    /// Rebuilds a thread whose adapter is resolved lazily through the
    /// singleton registered with [`Chat::register_singleton`].
    pub fn from_json(serialized: SerializedThread) -> Self {
        Self::restore(serialized, None)
    }

    /// Rebuilds a thread bound to `chat` right away.
    pub fn from_json_with(serialized: SerializedThread, chat: &Chat) -> Result<Self, ChatError> {
        let binding = chat.binding(&serialized.adapter_name)?;
        Ok(Self::restore(serialized, Some(binding)))
    }

    pub fn to_json(&self) -> SerializedThread {
        SerializedThread {
            tag: ThreadTag::Thread,
            id: self.inner.id.clone(),
            channel_id: self.inner.channel_id.clone(),
            is_dm: self.inner.is_dm,
            adapter_name: self.inner.adapter_name.clone(),
        }
    }

    pub(crate) fn binding(&self) -> Result<&Binding, ChatError> {
        if let Some(binding) = self.inner.binding.get() {
            return Ok(binding);
        }
        let resolved = singleton::binding_for(&self.inner.adapter_name)?;
        Ok(self.inner.binding.get_or_init(|| resolved))
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn channel_id(&self) -> &str {
        &self.inner.channel_id
    }

    pub fn adapter_name(&self) -> &str {
        &self.inner.adapter_name
    }

    pub fn is_dm(&self) -> bool {
        self.inner.is_dm
    }

    pub fn adapter(&self) -> Result<Arc<dyn Adapter>, ChatError> {
        Ok(Arc::clone(&self.binding()?.adapter))
    }

    /// The message that triggered the handler holding this thread.
    pub fn current_message(&self) -> Option<&Message> {
        self.inner.current_message.as_ref()
    }

    /// Cached messages: the triggering message until [`Thread::refresh`] runs.
    pub fn recent_messages(&self) -> Vec<Message> {
        self.inner
            .recent_messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The channel containing this thread, sharing its adapter binding.
    pub fn channel(&self) -> Result<Channel, ChatError> {
        if let Some(channel) = self.inner.channel.get() {
            return Ok(channel.clone());
        }
        let binding = self.binding()?.clone();
        let channel = Channel::bound(binding, &self.inner.channel_id, self.inner.is_dm);
        Ok(self.inner.channel.get_or_init(|| channel).clone())
    }

    pub async fn state(&self) -> Result<Option<serde_json::Value>, ChatError> {
        load_state(self.binding()?.state.as_ref(), &state_key(&self.inner.id)).await
    }

    /// Typed view of [`Thread::state`].
    pub async fn state_as<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>, ChatError> {
        match self.state().await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
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

    /// Posts a reply. Streams are delivered with the dispatcher's default
    /// options; use [`Thread::post_stream`] to override them.
    pub async fn post(
        &self,
        message: impl Into<PostableMessage> + Send,
    ) -> Result<SentMessage, ChatError> {
        match resolve(message.into())? {
            Resolved::Stream(stream) => self.post_stream(stream, StreamOptions::default()).await,
            Resolved::Message(message) => {
                let adapter = self.adapter()?;
                let raw = adapter.post_message(&self.inner.id, &message).await?;
                let text = plain_text(adapter.as_ref(), &message);
                Ok(SentMessage::from_raw(adapter, raw, text))
            }
        }
    }

    /// Streams a reply, natively when the adapter can, otherwise by editing
    /// a placeholder message.
    pub async fn post_stream(
        &self,
        stream: TextStream,
        options: StreamOptions,
    ) -> Result<SentMessage, ChatError> {
        let binding = self.binding()?;
        let options = self.with_recipient_hints(options);
        streaming::deliver(
            Arc::clone(&binding.adapter),
            &self.inner.id,
            stream,
            options,
            binding.streaming_update_interval,
            &binding.logger,
        )
        .await
    }

    fn with_recipient_hints(&self, mut options: StreamOptions) -> StreamOptions {
        if let Some(message) = &self.inner.current_message {
            if options.recipient_user_id.is_none() {
                options.recipient_user_id = Some(message.author.user_id.clone());
            }
            if options.recipient_team_id.is_none() {
                options.recipient_team_id = ["team_id", "team"]
                    .iter()
                    .find_map(|key| message.raw.get(*key).and_then(|v| v.as_str()))
                    .map(str::to_string);
            }
        }
        options
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

    /// Messages newest first, fetched backward page by page.
    pub fn messages(&self) -> MessageStream {
        let thread = self.clone();
        paginate(FetchDirection::Backward, move |cursor| {
            let thread = thread.clone();
            async move {
                let options = FetchOptions {
                    cursor,
                    direction: FetchDirection::Backward,
                    limit: None,
                };
                thread.adapter()?.fetch_messages(thread.id(), options).await
            }
        })
    }

    /// The whole history oldest first. Every call starts a fresh walk.
    pub fn all_messages(&self) -> MessageStream {
        let thread = self.clone();
        paginate(FetchDirection::Forward, move |cursor| {
            let thread = thread.clone();
            async move {
                let options = FetchOptions {
                    cursor,
                    direction: FetchDirection::Forward,
                    limit: Some(ALL_MESSAGES_PAGE),
                };
                thread.adapter()?.fetch_messages(thread.id(), options).await
            }
        })
    }

    /// Replaces [`Thread::recent_messages`] with the latest page.
    pub async fn refresh(&self) -> Result<(), ChatError> {
        let options = FetchOptions {
            cursor: None,
            direction: FetchDirection::Backward,
            limit: Some(RECENT_MESSAGES),
        };
        let page = self
            .adapter()?
            .fetch_messages(&self.inner.id, options)
            .await?;
        *self
            .inner
            .recent_messages
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = page.messages;
        Ok(())
    }

    /// True inside a subscribed-message handler without asking the backend.
    pub async fn is_subscribed(&self) -> Result<bool, ChatError> {
        if self.inner.is_subscribed_context {
            return Ok(true);
        }
        self.binding()?.state.is_subscribed(&self.inner.id).await
    }

    pub async fn subscribe(&self) -> Result<(), ChatError> {
        let binding = self.binding()?;
        binding.state.subscribe(&self.inner.id).await?;
        binding.adapter.on_thread_subscribe(&self.inner.id).await
    }

    pub async fn unsubscribe(&self) -> Result<(), ChatError> {
        self.binding()?.state.unsubscribe(&self.inner.id).await
    }

    /// Wraps a message from this thread so it can be edited or reacted to.
    pub fn create_sent_message_from_message(
        &self,
        message: Message,
    ) -> Result<SentMessage, ChatError> {
        Ok(SentMessage::from_message(self.adapter()?, message))
    }
}

#[async_trait]
impl Postable for Thread {
    fn id(&self) -> &str {
        Thread::id(self)
    }

    fn adapter_name(&self) -> &str {
        Thread::adapter_name(self)
    }

    fn adapter(&self) -> Result<Arc<dyn Adapter>, ChatError> {
        Thread::adapter(self)
    }

    fn is_dm(&self) -> bool {
        Thread::is_dm(self)
    }

    async fn state(&self) -> Result<Option<serde_json::Value>, ChatError> {
        Thread::state(self).await
    }

    async fn set_state(
        &self,
        state: serde_json::Value,
        options: SetStateOptions,
    ) -> Result<(), ChatError> {
        Thread::set_state(self, state, options).await
    }

    async fn post(&self, message: PostableMessage) -> Result<SentMessage, ChatError> {
        Thread::post(self, message).await
    }

    async fn post_ephemeral(
        &self,
        user: UserRef,
        message: PostableMessage,
        options: EphemeralOptions,
    ) -> Result<Option<EphemeralMessage>, ChatError> {
        Thread::post_ephemeral(self, user, message, options).await
    }

    async fn start_typing(&self) -> Result<(), ChatError> {
        Thread::start_typing(self).await
    }

    fn messages(&self) -> MessageStream {
        Thread::messages(self)
    }
}

impl std::fmt::Debug for Thread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.inner.id)
            .field("channel_id", &self.inner.channel_id)
            .field("adapter", &self.inner.adapter_name)
            .field("is_dm", &self.inner.is_dm)
            .finish()
    }
}

impl Serialize for Thread {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Thread {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        SerializedThread::deserialize(deserializer).map(Thread::from_json)
    }
}
