// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform adapter trait (Slack, Teams, Google Chat, Discord, ...).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ChatError;
use crate::events::WebhookOptions;
use crate::message::Message;
use crate::postable::{AdapterPostableMessage, ModalElement, TextStream};
use crate::traits::dispatcher::Dispatcher;
use crate::types::{
    AdapterCapabilities, ChannelInfo, EmojiValue, EphemeralMessage, FetchOptions, FetchResult,
    ListThreadsOptions, ListThreadsResult, RawMessage, StreamOptions, ThreadInfo,
};

/// Adapter for one chat platform.
///
/// Adapters normalize inbound webhooks into [`Message`]s and events, hand them
/// to the [`Dispatcher`] they received in [`Adapter::initialize`], and perform
/// every outbound call. Thread IDs are opaque but adapter-prefixed
/// (`"<adapter>:<channel>:<thread>"`).
///
/// Optional operations default to [`ChatError::NotSupported`]; an adapter that
/// overrides one must also advertise it in [`Adapter::capabilities`].
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Registry key and thread ID prefix.
    fn name(&self) -> &str;

    /// The bot's display name on this platform, used for mention detection.
    fn user_name(&self) -> &str;

    /// The bot's platform user ID, if known.
    fn bot_user_id(&self) -> Option<&str> {
        None
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::default()
    }

    /// Called once per dispatcher initialization.
    async fn initialize(&self, dispatcher: Arc<dyn Dispatcher>) -> Result<(), ChatError>;

    /// Verifies and parses a raw webhook, calling back into the dispatcher.
    async fn handle_webhook(
        &self,
        request: http::Request<Bytes>,
        options: WebhookOptions,
    ) -> Result<http::Response<Bytes>, ChatError>;

    async fn post_message(
        &self,
        thread_id: &str,
        message: &AdapterPostableMessage,
    ) -> Result<RawMessage, ChatError>;

    async fn edit_message(
        &self,
        thread_id: &str,
        message_id: &str,
        message: &AdapterPostableMessage,
    ) -> Result<RawMessage, ChatError>;

    async fn delete_message(&self, thread_id: &str, message_id: &str) -> Result<(), ChatError>;

    async fn add_reaction(
        &self,
        thread_id: &str,
        message_id: &str,
        emoji: &EmojiValue,
    ) -> Result<(), ChatError>;

    async fn remove_reaction(
        &self,
        thread_id: &str,
        message_id: &str,
        emoji: &EmojiValue,
    ) -> Result<(), ChatError>;

    async fn start_typing(&self, thread_id: &str) -> Result<(), ChatError>;

    /// Fetches one chronological page of a thread's history.
    async fn fetch_messages(
        &self,
        thread_id: &str,
        options: FetchOptions,
    ) -> Result<FetchResult, ChatError>;

    async fn fetch_thread(&self, thread_id: &str) -> Result<ThreadInfo, ChatError>;

    fn encode_thread_id(&self, data: &serde_json::Value) -> Result<String, ChatError>;

    fn decode_thread_id(&self, thread_id: &str) -> Result<serde_json::Value, ChatError>;

    fn parse_message(&self, raw: &serde_json::Value) -> Result<Message, ChatError>;

    /// Renders a markdown AST to the platform's text format.
    fn render_formatted(&self, ast: &serde_json::Value) -> String;

    fn is_dm(&self, _thread_id: &str) -> bool {
        false
    }

    /// Overrides the default `first-two-segments` channel derivation.
    fn channel_id_from_thread_id(&self, _thread_id: &str) -> Option<String> {
        None
    }

    async fn on_thread_subscribe(&self, _thread_id: &str) -> Result<(), ChatError> {
        Ok(())
    }

    /// Opens (or finds) a DM with the user and returns its thread ID.
    async fn open_dm(&self, _user_id: &str) -> Result<String, ChatError> {
        Err(ChatError::not_supported(self.name(), "open_dm"))
    }

    async fn open_modal(
        &self,
        _trigger_id: &str,
        _modal: &ModalElement,
        _context_id: Option<&str>,
    ) -> Result<String, ChatError> {
        Err(ChatError::not_supported(self.name(), "open_modal"))
    }

    /// Streams a reply natively. The adapter owns pacing entirely.
    async fn stream(
        &self,
        _thread_id: &str,
        _stream: TextStream,
        _options: &StreamOptions,
    ) -> Result<RawMessage, ChatError> {
        Err(ChatError::not_supported(self.name(), "stream"))
    }

    async fn post_ephemeral(
        &self,
        _thread_id: &str,
        _user_id: &str,
        _message: &AdapterPostableMessage,
    ) -> Result<EphemeralMessage, ChatError> {
        Err(ChatError::not_supported(self.name(), "post_ephemeral"))
    }

    async fn post_channel_message(
        &self,
        _channel_id: &str,
        _message: &AdapterPostableMessage,
    ) -> Result<RawMessage, ChatError> {
        Err(ChatError::not_supported(self.name(), "post_channel_message"))
    }

    async fn fetch_channel_messages(
        &self,
        _channel_id: &str,
        _options: FetchOptions,
    ) -> Result<FetchResult, ChatError> {
        Err(ChatError::not_supported(self.name(), "fetch_channel_messages"))
    }

    async fn fetch_channel_info(&self, _channel_id: &str) -> Result<ChannelInfo, ChatError> {
        Err(ChatError::not_supported(self.name(), "fetch_channel_info"))
    }

    async fn list_threads(
        &self,
        _channel_id: &str,
        _options: ListThreadsOptions,
    ) -> Result<ListThreadsResult, ChatError> {
        Err(ChatError::not_supported(self.name(), "list_threads"))
    }

    async fn fetch_message(
        &self,
        _thread_id: &str,
        _message_id: &str,
    ) -> Result<Option<Message>, ChatError> {
        Err(ChatError::not_supported(self.name(), "fetch_message"))
    }
}

/// Derives the channel ID that owns `thread_id`.
///
/// Uses the adapter's override when present, otherwise the first two
/// colon-separated segments (`"slack:C1:t1"` -> `"slack:C1"`).
pub fn derive_channel_id(adapter: &dyn Adapter, thread_id: &str) -> String {
    adapter
        .channel_id_from_thread_id(thread_id)
        .unwrap_or_else(|| default_channel_id(thread_id))
}

pub fn default_channel_id(thread_id: &str) -> String {
    thread_id.splitn(3, ':').take(2).collect::<Vec<_>>().join(":")
}
