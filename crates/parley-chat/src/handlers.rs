// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler registries.
//!
//! Registries are append-only. Dispatch takes a snapshot of the matching
//! handlers and runs them in registration order without holding any lock.

use std::future::Future;
use std::sync::{Arc, RwLock};

use futures::FutureExt;
use futures::future::BoxFuture;
use regex::Regex;

use parley_core::events::ModalResponse;
use parley_core::{EmojiValue, HandlerError, Message};

use crate::context::{ActionContext, ModalCloseContext, ModalSubmitContext, ReactionContext};
use crate::thread::Thread;

/// What user handlers return.
pub type HandlerResult<T = ()> = Result<T, HandlerError>;

pub(crate) type MessageHandler =
    Arc<dyn Fn(Thread, Message) -> BoxFuture<'static, HandlerResult> + Send + Sync>;
pub(crate) type ReactionHandler =
    Arc<dyn Fn(ReactionContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;
pub(crate) type ActionHandler =
    Arc<dyn Fn(ActionContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;
pub(crate) type ModalSubmitHandler = Arc<
    dyn Fn(ModalSubmitContext) -> BoxFuture<'static, HandlerResult<Option<ModalResponse>>>
        + Send
        + Sync,
>;
pub(crate) type ModalCloseHandler =
    Arc<dyn Fn(ModalCloseContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Selects which reactions a handler receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmojiFilter {
    /// A normalized emoji value.
    Value(EmojiValue),
    /// Either the normalized name or the platform's raw spelling.
    Name(String),
}

impl EmojiFilter {
    pub fn matches(&self, emoji: &EmojiValue, raw_emoji: &str) -> bool {
        match self {
            EmojiFilter::Value(value) => value == emoji || value.name() == raw_emoji,
            EmojiFilter::Name(name) => name == emoji.name() || name == raw_emoji,
        }
    }
}

impl From<EmojiValue> for EmojiFilter {
    fn from(value: EmojiValue) -> Self {
        EmojiFilter::Value(value)
    }
}

impl From<&str> for EmojiFilter {
    fn from(name: &str) -> Self {
        EmojiFilter::Name(name.to_string())
    }
}

impl From<String> for EmojiFilter {
    fn from(name: String) -> Self {
        EmojiFilter::Name(name)
    }
}

pub(crate) fn boxed_message_handler<F, Fut>(handler: F) -> MessageHandler
where
    F: Fn(Thread, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |thread, message| handler(thread, message).boxed())
}

pub(crate) fn boxed_context_handler<C, T, F, Fut>(
    handler: F,
) -> Arc<dyn Fn(C) -> BoxFuture<'static, HandlerResult<T>> + Send + Sync>
where
    C: 'static,
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<T>> + Send + 'static,
{
    Arc::new(move |context| handler(context).boxed())
}

/// An append-only list of handlers, each tagged with its filter.
struct Registry<K, H> {
    entries: RwLock<Vec<(K, H)>>,
}

impl<K: Clone, H: Clone> Registry<K, H> {
    fn push(&self, key: K, handler: H) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((key, handler));
    }

    fn matching(&self, accept: impl Fn(&K) -> bool) -> Vec<H> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(key, _)| accept(key))
            .map(|(_, handler)| handler.clone())
            .collect()
    }
}

impl<K, H> Default for Registry<K, H> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

/// Every handler registered on a [`Chat`](crate::Chat).
#[derive(Default)]
pub(crate) struct Handlers {
    mention: Registry<(), MessageHandler>,
    pattern: Registry<Regex, MessageHandler>,
    subscribed: Registry<(), MessageHandler>,
    reaction: Registry<Vec<EmojiFilter>, ReactionHandler>,
    action: Registry<Vec<String>, ActionHandler>,
    modal_submit: Registry<Vec<String>, ModalSubmitHandler>,
    modal_close: Registry<Vec<String>, ModalCloseHandler>,
}

/// Empty filter lists accept everything.
fn id_matches(filter: &[String], id: &str) -> bool {
    filter.is_empty() || filter.iter().any(|f| f == id)
}

impl Handlers {
    pub fn add_mention(&self, handler: MessageHandler) {
        self.mention.push((), handler);
    }

    pub fn add_pattern(&self, pattern: Regex, handler: MessageHandler) {
        self.pattern.push(pattern, handler);
    }

    pub fn add_subscribed(&self, handler: MessageHandler) {
        self.subscribed.push((), handler);
    }

    pub fn add_reaction(&self, filter: Vec<EmojiFilter>, handler: ReactionHandler) {
        self.reaction.push(filter, handler);
    }

    pub fn add_action(&self, filter: Vec<String>, handler: ActionHandler) {
        self.action.push(filter, handler);
    }

    pub fn add_modal_submit(&self, filter: Vec<String>, handler: ModalSubmitHandler) {
        self.modal_submit.push(filter, handler);
    }

    pub fn add_modal_close(&self, filter: Vec<String>, handler: ModalCloseHandler) {
        self.modal_close.push(filter, handler);
    }

    pub fn mention(&self) -> Vec<MessageHandler> {
        self.mention.matching(|_| true)
    }

    pub fn subscribed(&self) -> Vec<MessageHandler> {
        self.subscribed.matching(|_| true)
    }

    /// Handlers of every pattern found in `text`, not just the first.
    pub fn patterns_matching(&self, text: &str) -> Vec<MessageHandler> {
        self.pattern.matching(|pattern| pattern.is_match(text))
    }

    pub fn reactions_for(&self, emoji: &EmojiValue, raw_emoji: &str) -> Vec<ReactionHandler> {
        self.reaction.matching(|filter| {
            filter.is_empty() || filter.iter().any(|f| f.matches(emoji, raw_emoji))
        })
    }

    pub fn actions_for(&self, action_id: &str) -> Vec<ActionHandler> {
        self.action.matching(|filter| id_matches(filter, action_id))
    }

    pub fn modal_submits_for(&self, callback_id: &str) -> Vec<ModalSubmitHandler> {
        self.modal_submit
            .matching(|filter| id_matches(filter, callback_id))
    }

    pub fn modal_closes_for(&self, callback_id: &str) -> Vec<ModalCloseHandler> {
        self.modal_close
            .matching(|filter| id_matches(filter, callback_id))
    }
}
