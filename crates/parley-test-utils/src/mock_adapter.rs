// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock platform adapter for deterministic testing.
//!
//! `MockAdapter` implements [`Adapter`] by recording every outbound call for
//! later assertion and serving thread/channel history from in-memory vectors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::Mutex;

use parley_core::events::{MessageSource, WebhookOptions};
use parley_core::postable::{AdapterPostableMessage, ModalElement, TextStream};
use parley_core::types::{
    AdapterCapabilities, ChannelInfo, EmojiValue, EphemeralMessage, FetchDirection, FetchOptions,
    FetchResult, ListThreadsOptions, ListThreadsResult, RawMessage, StreamOptions, ThreadInfo,
    ThreadSummary,
};
use parley_core::{Adapter, ChatError, Dispatcher, Message, derive_channel_id};

const DEFAULT_PAGE: usize = 50;

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    Post {
        thread_id: String,
        message: AdapterPostableMessage,
    },
    Edit {
        thread_id: String,
        message_id: String,
        message: AdapterPostableMessage,
    },
    Delete {
        thread_id: String,
        message_id: String,
    },
    AddReaction {
        thread_id: String,
        message_id: String,
        emoji: EmojiValue,
    },
    RemoveReaction {
        thread_id: String,
        message_id: String,
        emoji: EmojiValue,
    },
    StartTyping {
        thread_id: String,
    },
    Stream {
        thread_id: String,
        text: String,
        options: StreamOptions,
    },
    PostEphemeral {
        thread_id: String,
        user_id: String,
        message: AdapterPostableMessage,
    },
    PostChannel {
        channel_id: String,
        message: AdapterPostableMessage,
    },
    OpenDm {
        user_id: String,
    },
    OpenModal {
        trigger_id: String,
        modal: ModalElement,
        context_id: Option<String>,
    },
    Subscribe {
        thread_id: String,
    },
    FetchMessages {
        thread_id: String,
        options: FetchOptions,
    },
    FetchChannelMessages {
        channel_id: String,
        options: FetchOptions,
    },
}

/// Inbound webhook body understood by [`MockAdapter::handle_webhook`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MockWebhook {
    thread_id: String,
    message: Message,
}

/// A mock chat platform.
pub struct MockAdapter {
    name: String,
    user_name: String,
    bot_user_id: Option<String>,
    capabilities: AdapterCapabilities,
    dispatcher: RwLock<Option<Arc<dyn Dispatcher>>>,
    initialized: AtomicUsize,
    next_id: AtomicUsize,
    fail_edits: AtomicBool,
    calls: Mutex<Vec<AdapterCall>>,
    history: Mutex<HashMap<String, Vec<Message>>>,
    channel_history: Mutex<HashMap<String, Vec<Message>>>,
    threads: Mutex<Vec<ThreadSummary>>,
}

impl MockAdapter {
    /// Create a mock adapter with no optional capabilities.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            user_name: "bot".to_string(),
            bot_user_id: None,
            capabilities: AdapterCapabilities::default(),
            dispatcher: RwLock::new(None),
            initialized: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
            fail_edits: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            history: Mutex::new(HashMap::new()),
            channel_history: Mutex::new(HashMap::new()),
            threads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user_name(mut self, user_name: &str) -> Self {
        self.user_name = user_name.to_string();
        self
    }

    pub fn with_bot_user_id(mut self, bot_user_id: &str) -> Self {
        self.bot_user_id = Some(bot_user_id.to_string());
        self
    }

    pub fn with_capabilities(mut self, capabilities: AdapterCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Every optional capability switched on.
    pub fn with_all_capabilities(self) -> Self {
        self.with_capabilities(AdapterCapabilities {
            stream: true,
            post_ephemeral: true,
            open_dm: true,
            open_modal: true,
            post_channel_message: true,
            fetch_channel_messages: true,
            fetch_channel_info: true,
            list_threads: true,
            fetch_message: true,
        })
    }

    /// Make every subsequent `edit_message` fail.
    pub fn set_fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    /// Seed a thread's chronological history.
    pub async fn set_history(&self, thread_id: &str, messages: Vec<Message>) {
        self.history
            .lock()
            .await
            .insert(thread_id.to_string(), messages);
    }

    /// Seed a channel's top-level chronological history.
    pub async fn set_channel_history(&self, channel_id: &str, messages: Vec<Message>) {
        self.channel_history
            .lock()
            .await
            .insert(channel_id.to_string(), messages);
    }

    pub async fn set_threads(&self, threads: Vec<ThreadSummary>) {
        *self.threads.lock().await = threads;
    }

    /// Number of times `initialize` ran.
    pub fn initialize_count(&self) -> usize {
        self.initialized.load(Ordering::SeqCst)
    }

    /// The dispatcher handed over in the most recent `initialize`.
    pub fn dispatcher(&self) -> Option<Arc<dyn Dispatcher>> {
        self.dispatcher
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub async fn calls(&self) -> Vec<AdapterCall> {
        self.calls.lock().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    /// Messages passed to `post_message`, in order.
    pub async fn posts(&self) -> Vec<AdapterPostableMessage> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                AdapterCall::Post { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Messages passed to `edit_message`, in order.
    pub async fn edits(&self) -> Vec<AdapterPostableMessage> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                AdapterCall::Edit { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: AdapterCall) {
        self.calls.lock().await.push(call);
    }

    fn next_message_id(&self) -> String {
        format!("msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn raw_message(&self, thread_id: &str) -> RawMessage {
        let id = self.next_message_id();
        RawMessage {
            raw: serde_json::json!({ "id": id }),
            id,
            thread_id: thread_id.to_string(),
        }
    }
}

/// Slices one page out of a chronological history.
///
/// Cursors are indices into `messages`: the exclusive end for backward
/// pages, the inclusive start for forward pages.
fn paginate(messages: &[Message], options: &FetchOptions) -> FetchResult {
    let limit = options.limit.unwrap_or(DEFAULT_PAGE).max(1);
    let cursor = options.cursor.as_deref().and_then(|c| c.parse::<usize>().ok());
    match options.direction {
        FetchDirection::Backward => {
            let end = cursor.unwrap_or(messages.len()).min(messages.len());
            let start = end.saturating_sub(limit);
            FetchResult {
                messages: messages[start..end].to_vec(),
                next_cursor: (start > 0).then(|| start.to_string()),
            }
        }
        FetchDirection::Forward => {
            let start = cursor.unwrap_or(0).min(messages.len());
            let end = (start + limit).min(messages.len());
            FetchResult {
                messages: messages[start..end].to_vec(),
                next_cursor: (end < messages.len()).then(|| end.to_string()),
            }
        }
    }
}

fn text_response(status: http::StatusCode, body: &'static str) -> http::Response<Bytes> {
    let mut response = http::Response::new(Bytes::from_static(body.as_bytes()));
    *response.status_mut() = status;
    response
}

#[async_trait]
impl Adapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn user_name(&self) -> &str {
        &self.user_name
    }

    fn bot_user_id(&self) -> Option<&str> {
        self.bot_user_id.as_deref()
    }

    fn capabilities(&self) -> AdapterCapabilities {
        self.capabilities
    }

    async fn initialize(&self, dispatcher: Arc<dyn Dispatcher>) -> Result<(), ChatError> {
        *self.dispatcher.write().unwrap_or_else(|e| e.into_inner()) = Some(dispatcher);
        self.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn handle_webhook(
        &self,
        request: http::Request<Bytes>,
        options: WebhookOptions,
    ) -> Result<http::Response<Bytes>, ChatError> {
        let Some(dispatcher) = self.dispatcher() else {
            return Err(ChatError::adapter("mock adapter is not initialized"));
        };
        let Ok(webhook) = serde_json::from_slice::<MockWebhook>(request.body()) else {
            return Ok(text_response(http::StatusCode::BAD_REQUEST, "invalid payload"));
        };
        dispatcher.process_message(
            &self.name,
            &webhook.thread_id,
            MessageSource::Ready(webhook.message),
            options,
        );
        Ok(text_response(http::StatusCode::OK, "ok"))
    }

    async fn post_message(
        &self,
        thread_id: &str,
        message: &AdapterPostableMessage,
    ) -> Result<RawMessage, ChatError> {
        self.record(AdapterCall::Post {
            thread_id: thread_id.to_string(),
            message: message.clone(),
        })
        .await;
        Ok(self.raw_message(thread_id))
    }

    async fn edit_message(
        &self,
        thread_id: &str,
        message_id: &str,
        message: &AdapterPostableMessage,
    ) -> Result<RawMessage, ChatError> {
        self.record(AdapterCall::Edit {
            thread_id: thread_id.to_string(),
            message_id: message_id.to_string(),
            message: message.clone(),
        })
        .await;
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(ChatError::adapter("edit rejected"));
        }
        Ok(RawMessage {
            id: message_id.to_string(),
            thread_id: thread_id.to_string(),
            raw: serde_json::Value::Null,
        })
    }

    async fn delete_message(&self, thread_id: &str, message_id: &str) -> Result<(), ChatError> {
        self.record(AdapterCall::Delete {
            thread_id: thread_id.to_string(),
            message_id: message_id.to_string(),
        })
        .await;
        Ok(())
    }

    async fn add_reaction(
        &self,
        thread_id: &str,
        message_id: &str,
        emoji: &EmojiValue,
    ) -> Result<(), ChatError> {
        self.record(AdapterCall::AddReaction {
            thread_id: thread_id.to_string(),
            message_id: message_id.to_string(),
            emoji: emoji.clone(),
        })
        .await;
        Ok(())
    }

    async fn remove_reaction(
        &self,
        thread_id: &str,
        message_id: &str,
        emoji: &EmojiValue,
    ) -> Result<(), ChatError> {
        self.record(AdapterCall::RemoveReaction {
            thread_id: thread_id.to_string(),
            message_id: message_id.to_string(),
            emoji: emoji.clone(),
        })
        .await;
        Ok(())
    }

    async fn start_typing(&self, thread_id: &str) -> Result<(), ChatError> {
        self.record(AdapterCall::StartTyping {
            thread_id: thread_id.to_string(),
        })
        .await;
        Ok(())
    }

    async fn fetch_messages(
        &self,
        thread_id: &str,
        options: FetchOptions,
    ) -> Result<FetchResult, ChatError> {
        self.record(AdapterCall::FetchMessages {
            thread_id: thread_id.to_string(),
            options: options.clone(),
        })
        .await;
        let history = self.history.lock().await;
        let messages = history.get(thread_id).map(Vec::as_slice).unwrap_or_default();
        Ok(paginate(messages, &options))
    }

    async fn fetch_thread(&self, thread_id: &str) -> Result<ThreadInfo, ChatError> {
        Ok(ThreadInfo {
            id: thread_id.to_string(),
            channel_id: derive_channel_id(self, thread_id),
            channel_name: Some("general".to_string()),
            is_dm: self.is_dm(thread_id),
            metadata: serde_json::json!({}),
        })
    }

    fn encode_thread_id(&self, data: &serde_json::Value) -> Result<String, ChatError> {
        let channel = data
            .get("channel")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChatError::adapter("thread data is missing `channel`"))?;
        match data.get("thread").and_then(|v| v.as_str()) {
            Some(thread) => Ok(format!("{}:{channel}:{thread}", self.name)),
            None => Ok(format!("{}:{channel}", self.name)),
        }
    }

    fn decode_thread_id(&self, thread_id: &str) -> Result<serde_json::Value, ChatError> {
        let mut parts = thread_id.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(channel), thread) if prefix == self.name => Ok(serde_json::json!({
                "channel": channel,
                "thread": thread,
            })),
            _ => Err(ChatError::adapter(format!("invalid thread id: {thread_id}"))),
        }
    }

    fn parse_message(&self, raw: &serde_json::Value) -> Result<Message, ChatError> {
        Ok(serde_json::from_value(raw.clone())?)
    }

    fn render_formatted(&self, ast: &serde_json::Value) -> String {
        match ast.get("text").and_then(|t| t.as_str()) {
            Some(text) => text.to_string(),
            None => ast.to_string(),
        }
    }

    fn is_dm(&self, thread_id: &str) -> bool {
        thread_id.contains(":DM-")
    }

    async fn on_thread_subscribe(&self, thread_id: &str) -> Result<(), ChatError> {
        self.record(AdapterCall::Subscribe {
            thread_id: thread_id.to_string(),
        })
        .await;
        Ok(())
    }

    async fn open_dm(&self, user_id: &str) -> Result<String, ChatError> {
        if !self.capabilities.open_dm {
            return Err(ChatError::not_supported(&self.name, "open_dm"));
        }
        self.record(AdapterCall::OpenDm {
            user_id: user_id.to_string(),
        })
        .await;
        Ok(format!("{}:DM-{user_id}", self.name))
    }

    async fn open_modal(
        &self,
        trigger_id: &str,
        modal: &ModalElement,
        context_id: Option<&str>,
    ) -> Result<String, ChatError> {
        if !self.capabilities.open_modal {
            return Err(ChatError::not_supported(&self.name, "open_modal"));
        }
        self.record(AdapterCall::OpenModal {
            trigger_id: trigger_id.to_string(),
            modal: modal.clone(),
            context_id: context_id.map(str::to_string),
        })
        .await;
        Ok(format!("view-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn stream(
        &self,
        thread_id: &str,
        mut stream: TextStream,
        options: &StreamOptions,
    ) -> Result<RawMessage, ChatError> {
        if !self.capabilities.stream {
            return Err(ChatError::not_supported(&self.name, "stream"));
        }
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            text.push_str(&chunk?);
        }
        self.record(AdapterCall::Stream {
            thread_id: thread_id.to_string(),
            text,
            options: options.clone(),
        })
        .await;
        Ok(self.raw_message(thread_id))
    }

    async fn post_ephemeral(
        &self,
        thread_id: &str,
        user_id: &str,
        message: &AdapterPostableMessage,
    ) -> Result<EphemeralMessage, ChatError> {
        if !self.capabilities.post_ephemeral {
            return Err(ChatError::not_supported(&self.name, "post_ephemeral"));
        }
        self.record(AdapterCall::PostEphemeral {
            thread_id: thread_id.to_string(),
            user_id: user_id.to_string(),
            message: message.clone(),
        })
        .await;
        Ok(EphemeralMessage {
            id: self.next_message_id(),
            thread_id: thread_id.to_string(),
            used_fallback: false,
            raw: serde_json::Value::Null,
        })
    }

    async fn post_channel_message(
        &self,
        channel_id: &str,
        message: &AdapterPostableMessage,
    ) -> Result<RawMessage, ChatError> {
        if !self.capabilities.post_channel_message {
            return Err(ChatError::not_supported(&self.name, "post_channel_message"));
        }
        self.record(AdapterCall::PostChannel {
            channel_id: channel_id.to_string(),
            message: message.clone(),
        })
        .await;
        Ok(self.raw_message(channel_id))
    }

    async fn fetch_channel_messages(
        &self,
        channel_id: &str,
        options: FetchOptions,
    ) -> Result<FetchResult, ChatError> {
        if !self.capabilities.fetch_channel_messages {
            return Err(ChatError::not_supported(&self.name, "fetch_channel_messages"));
        }
        self.record(AdapterCall::FetchChannelMessages {
            channel_id: channel_id.to_string(),
            options: options.clone(),
        })
        .await;
        let history = self.channel_history.lock().await;
        let messages = history.get(channel_id).map(Vec::as_slice).unwrap_or_default();
        Ok(paginate(messages, &options))
    }

    async fn fetch_channel_info(&self, channel_id: &str) -> Result<ChannelInfo, ChatError> {
        if !self.capabilities.fetch_channel_info {
            return Err(ChatError::not_supported(&self.name, "fetch_channel_info"));
        }
        Ok(ChannelInfo {
            id: channel_id.to_string(),
            name: Some("general".to_string()),
            is_dm: channel_id.contains(":DM-"),
            member_count: Some(3),
            metadata: serde_json::json!({ "topic": "testing" }),
        })
    }

    async fn list_threads(
        &self,
        _channel_id: &str,
        options: ListThreadsOptions,
    ) -> Result<ListThreadsResult, ChatError> {
        if !self.capabilities.list_threads {
            return Err(ChatError::not_supported(&self.name, "list_threads"));
        }
        let threads = self.threads.lock().await;
        let limit = options.limit.unwrap_or(DEFAULT_PAGE).max(1);
        let start = options
            .cursor
            .as_deref()
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or(0)
            .min(threads.len());
        let end = (start + limit).min(threads.len());
        Ok(ListThreadsResult {
            threads: threads[start..end].to_vec(),
            next_cursor: (end < threads.len()).then(|| end.to_string()),
        })
    }

    async fn fetch_message(
        &self,
        thread_id: &str,
        message_id: &str,
    ) -> Result<Option<Message>, ChatError> {
        if !self.capabilities.fetch_message {
            return Err(ChatError::not_supported(&self.name, "fetch_message"));
        }
        let history = self.history.lock().await;
        Ok(history
            .get(thread_id)
            .and_then(|messages| messages.iter().find(|m| m.id == message_id))
            .cloned())
    }
}
