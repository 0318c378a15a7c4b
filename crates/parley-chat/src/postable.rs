// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The posting contract shared by [`Thread`](crate::Thread) and
//! [`Channel`](crate::Channel), plus the helpers both build on.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};

use parley_core::postable::{AdapterPostableMessage, PostableMessage, TextStream, jsx_to_card};
use parley_core::types::{EphemeralMessage, FetchDirection, FetchResult, UserRef};
use parley_core::{Adapter, ChatError, Logger, Message, StateAdapter};

use crate::sent::SentMessage;

/// TTL for `thread-state:` and `channel-state:` entries.
pub const STATE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// A lazily paginated sequence of messages.
pub type MessageStream = BoxStream<'static, Result<Message, ChatError>>;

/// Options for `set_state`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetStateOptions {
    /// Overwrite the stored value instead of shallow-merging into it.
    pub replace: bool,
}

impl SetStateOptions {
    pub fn replace() -> Self {
        Self { replace: true }
    }
}

/// Options for `post_ephemeral`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EphemeralOptions {
    /// Deliver as a DM when the platform has no native ephemeral messages.
    pub fallback_to_dm: bool,
}

/// Everything a thread or channel needs from the dispatcher to talk to its
/// platform.
#[derive(Clone)]
pub(crate) struct Binding {
    pub adapter: Arc<dyn Adapter>,
    pub state: Arc<dyn StateAdapter>,
    pub streaming_update_interval: Duration,
    pub logger: Logger,
}

/// Something bot code can post to: a thread or a channel.
#[async_trait]
pub trait Postable: Send + Sync {
    fn id(&self) -> &str;

    fn adapter_name(&self) -> &str;

    fn adapter(&self) -> Result<Arc<dyn Adapter>, ChatError>;

    fn is_dm(&self) -> bool;

    async fn state(&self) -> Result<Option<serde_json::Value>, ChatError>;

    async fn set_state(
        &self,
        state: serde_json::Value,
        options: SetStateOptions,
    ) -> Result<(), ChatError>;

    async fn post(&self, message: PostableMessage) -> Result<SentMessage, ChatError>;

    /// Returns `Ok(None)` when neither native ephemeral messages nor the DM
    /// fallback are available.
    async fn post_ephemeral(
        &self,
        user: UserRef,
        message: PostableMessage,
        options: EphemeralOptions,
    ) -> Result<Option<EphemeralMessage>, ChatError>;

    async fn start_typing(&self) -> Result<(), ChatError>;

    /// Platform mention markup for a user.
    fn mention_user(&self, user_id: &str) -> String {
        format!("<@{user_id}>")
    }

    /// Messages newest first, fetched page by page.
    fn messages(&self) -> MessageStream;
}

/// Postable content after JSX rendering.
pub(crate) enum Resolved {
    Message(AdapterPostableMessage),
    Stream(TextStream),
}

pub(crate) fn resolve(message: PostableMessage) -> Result<Resolved, ChatError> {
    match message {
        PostableMessage::Message(message) => Ok(Resolved::Message(message)),
        PostableMessage::Jsx(component) => Ok(Resolved::Message(AdapterPostableMessage::Card {
            card: jsx_to_card(component.as_ref())?,
            fallback_text: None,
        })),
        PostableMessage::Stream(stream) => Ok(Resolved::Stream(stream)),
    }
}

/// Resolves content that cannot be a stream (edits, ephemeral posts).
pub(crate) fn resolve_static(
    message: PostableMessage,
    operation: &str,
) -> Result<AdapterPostableMessage, ChatError> {
    match resolve(message)? {
        Resolved::Message(message) => Ok(message),
        Resolved::Stream(_) => Err(ChatError::InvalidElement(format!(
            "{operation} does not accept a stream"
        ))),
    }
}

/// Plain text for the bookkeeping copy of a posted message.
pub(crate) fn plain_text(adapter: &dyn Adapter, message: &AdapterPostableMessage) -> String {
    match message {
        AdapterPostableMessage::Ast(ast) => adapter.render_formatted(ast),
        other => other.text().unwrap_or_default().to_string(),
    }
}

pub(crate) async fn load_state(
    state: &dyn StateAdapter,
    key: &str,
) -> Result<Option<serde_json::Value>, ChatError> {
    state.get(key).await
}

/// Read-merge-write of a state entry.
///
/// Objects are merged one level deep; anything else replaces the stored value.
pub(crate) async fn merge_state(
    state: &dyn StateAdapter,
    key: &str,
    value: serde_json::Value,
    options: SetStateOptions,
) -> Result<(), ChatError> {
    let merged = if options.replace {
        value
    } else {
        match (state.get(key).await?, value) {
            (Some(serde_json::Value::Object(mut existing)), serde_json::Value::Object(update)) => {
                existing.extend(update);
                serde_json::Value::Object(existing)
            }
            (_, value) => value,
        }
    };
    state.set(key, merged, Some(STATE_TTL)).await
}

/// Native ephemeral post, else DM fallback, else `None`.
pub(crate) async fn post_ephemeral_via(
    adapter: &dyn Adapter,
    target_id: &str,
    user: UserRef,
    message: PostableMessage,
    options: EphemeralOptions,
) -> Result<Option<EphemeralMessage>, ChatError> {
    let message = resolve_static(message, "post_ephemeral")?;
    let user_id = user.user_id();
    let capabilities = adapter.capabilities();

    if capabilities.post_ephemeral {
        return adapter
            .post_ephemeral(target_id, user_id, &message)
            .await
            .map(Some);
    }
    if !options.fallback_to_dm || !capabilities.open_dm {
        return Ok(None);
    }

    let dm_thread = adapter.open_dm(user_id).await?;
    let sent = adapter.post_message(&dm_thread, &message).await?;
    Ok(Some(EphemeralMessage {
        id: sent.id,
        thread_id: sent.thread_id,
        used_fallback: true,
        raw: sent.raw,
    }))
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Turns a page fetcher into a flat message stream.
///
/// Backward pages are reversed so the stream runs newest first. Pagination
/// ends when the adapter returns no cursor or an empty page.
pub(crate) fn paginate<F, Fut>(direction: FetchDirection, fetch: F) -> MessageStream
where
    F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchResult, ChatError>> + Send + 'static,
{
    stream::try_unfold((fetch, Cursor::Start), move |(fetch, cursor)| async move {
        let cursor = match cursor {
            Cursor::Start => None,
            Cursor::Next(cursor) => Some(cursor),
            Cursor::Done => return Ok::<_, ChatError>(None),
        };
        let page = fetch(cursor).await?;
        let mut messages = page.messages;
        if direction == FetchDirection::Backward {
            messages.reverse();
        }
        let next = match page.next_cursor {
            Some(cursor) if !messages.is_empty() => Cursor::Next(cursor),
            _ => Cursor::Done,
        };
        let page = stream::iter(messages.into_iter().map(Ok::<_, ChatError>));
        Ok(Some((page, (fetch, next))))
    })
    .try_flatten()
    .boxed()
}
