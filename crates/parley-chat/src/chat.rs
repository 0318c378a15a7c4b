// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatcher.
//!
//! [`Chat`] owns the adapters, the state backend and the handler
//! registries. Adapters call back into it through the [`Dispatcher`] handle
//! they receive at initialization; each inbound message is deduplicated,
//! processed under a per-thread lock, and routed to exactly one class of
//! handlers: subscribed, mention, or pattern.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, LazyLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use regex::Regex;

use parley_core::events::{
    ActionEvent, MessageSource, ModalCloseEvent, ModalResponse, ModalSubmitEvent, ReactionEvent,
    WebhookOptions,
};
use parley_core::types::UserRef;
use parley_core::{Adapter, ChatError, Dispatcher, Logger, Message, StateAdapter};

use crate::channel::Channel;
use crate::config::ChatConfig;
use crate::context::{
    ActionContext, ModalCloseContext, ModalSubmitContext, ReactionContext, restore_modal_context,
};
use crate::handlers::{
    EmojiFilter, Handlers, HandlerResult, boxed_context_handler, boxed_message_handler,
};
use crate::mention::detect_mention;
use crate::postable::Binding;
use crate::serialize::Reviver;
use crate::singleton;
use crate::thread::{Thread, ThreadContext};

static GCHAT_USER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^users/").expect("valid regex"));
static TEAMS_USER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^29:").expect("valid regex"));
static SLACK_USER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^U[A-Z0-9]+$").expect("valid regex"));
static DISCORD_USER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{17,19}$").expect("valid regex"));

fn dedupe_key(adapter_name: &str, message_id: &str) -> String {
    format!("dedupe:{adapter_name}:{message_id}")
}

/// The chat-bot dispatcher. Cloning is cheap; clones share everything.
#[derive(Clone)]
pub struct Chat {
    inner: Arc<ChatInner>,
}

struct ChatInner {
    user_name: String,
    adapters: HashMap<String, Arc<dyn Adapter>>,
    state: Arc<dyn StateAdapter>,
    logger: Logger,
    streaming_update_interval: Duration,
    dedupe_ttl: Duration,
    lock_ttl: Duration,
    initialized: tokio::sync::Mutex<bool>,
    handlers: Handlers,
}

impl Chat {
    pub fn new(config: ChatConfig) -> Self {
        let adapters = config
            .adapters
            .into_iter()
            .map(|adapter| (adapter.name().to_string(), adapter))
            .collect();
        Self {
            inner: Arc::new(ChatInner {
                user_name: config.user_name,
                adapters,
                state: config.state,
                logger: Logger::new("chat", config.log_level),
                streaming_update_interval: config.streaming_update_interval,
                dedupe_ttl: config.dedupe_ttl,
                lock_ttl: config.lock_ttl,
                initialized: tokio::sync::Mutex::new(false),
                handlers: Handlers::default(),
            }),
        }
    }

    // --- lifecycle -------------------------------------------------------

    /// Connects the state backend and initializes every adapter in parallel.
    ///
    /// Idempotent; concurrent callers wait for the first to finish.
    pub async fn initialize(&self) -> Result<(), ChatError> {
        let mut initialized = self.inner.initialized.lock().await;
        if *initialized {
            return Ok(());
        }

        self.inner.logger.debug("initializing");
        self.inner.state.connect().await?;
        let handle: Arc<dyn Dispatcher> = Arc::new(ChatHandle::new(self));
        futures::future::try_join_all(
            self.inner
                .adapters
                .values()
                .map(|adapter| adapter.initialize(Arc::clone(&handle))),
        )
        .await?;

        *initialized = true;
        self.inner.logger.info(format!(
            "initialized with adapters: {}",
            self.adapter_names().join(", ")
        ));
        Ok(())
    }

    /// Disconnects the state backend. A later call re-initializes.
    pub async fn shutdown(&self) -> Result<(), ChatError> {
        let mut initialized = self.inner.initialized.lock().await;
        if !*initialized {
            return Ok(());
        }
        self.inner.state.disconnect().await?;
        *initialized = false;
        self.inner.logger.info("shut down");
        Ok(())
    }

    /// Hands a raw webhook request to the named adapter, initializing first.
    pub async fn handle_webhook(
        &self,
        adapter_name: &str,
        request: http::Request<Bytes>,
        options: WebhookOptions,
    ) -> Result<http::Response<Bytes>, ChatError> {
        let adapter = self.adapter_or_err(adapter_name)?;
        self.initialize().await?;
        adapter.handle_webhook(request, options).await
    }

    // --- registration ----------------------------------------------------

    /// Runs for mentions of the bot in threads nobody is subscribed to.
    pub fn on_new_mention<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Thread, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.inner
            .handlers
            .add_mention(boxed_message_handler(handler));
        self
    }

    /// Runs for unsubscribed, non-mention messages whose text matches
    /// `pattern`. Every matching pattern fires.
    pub fn on_new_message<F, Fut>(&self, pattern: Regex, handler: F) -> &Self
    where
        F: Fn(Thread, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.inner
            .handlers
            .add_pattern(pattern, boxed_message_handler(handler));
        self
    }

    /// Runs for every message in a subscribed thread.
    pub fn on_subscribed_message<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Thread, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.inner
            .handlers
            .add_subscribed(boxed_message_handler(handler));
        self
    }

    pub fn on_reaction<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(ReactionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on_reaction_matching(Vec::<EmojiFilter>::new(), handler)
    }

    /// Runs for reactions matching any filter. An empty list matches all.
    pub fn on_reaction_matching<I, E, F, Fut>(&self, filter: I, handler: F) -> &Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EmojiFilter>,
        F: Fn(ReactionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let filter = filter.into_iter().map(Into::into).collect();
        self.inner
            .handlers
            .add_reaction(filter, boxed_context_handler(handler));
        self
    }

    pub fn on_action<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on_action_matching(Vec::<String>::new(), handler)
    }

    /// Runs for actions whose ID is in `action_ids`. An empty list matches all.
    pub fn on_action_matching<I, S, F, Fut>(&self, action_ids: I, handler: F) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let filter = action_ids.into_iter().map(Into::into).collect();
        self.inner
            .handlers
            .add_action(filter, boxed_context_handler(handler));
        self
    }

    pub fn on_modal_submit<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(ModalSubmitContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Option<ModalResponse>>> + Send + 'static,
    {
        self.on_modal_submit_matching(Vec::<String>::new(), handler)
    }

    /// The first handler returning a response answers the platform.
    pub fn on_modal_submit_matching<I, S, F, Fut>(&self, callback_ids: I, handler: F) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(ModalSubmitContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Option<ModalResponse>>> + Send + 'static,
    {
        let filter = callback_ids.into_iter().map(Into::into).collect();
        self.inner
            .handlers
            .add_modal_submit(filter, boxed_context_handler(handler));
        self
    }

    pub fn on_modal_close<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(ModalCloseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on_modal_close_matching(Vec::<String>::new(), handler)
    }

    pub fn on_modal_close_matching<I, S, F, Fut>(&self, callback_ids: I, handler: F) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(ModalCloseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let filter = callback_ids.into_iter().map(Into::into).collect();
        self.inner
            .handlers
            .add_modal_close(filter, boxed_context_handler(handler));
        self
    }

    // --- accessors -------------------------------------------------------

    pub fn user_name(&self) -> &str {
        &self.inner.user_name
    }

    pub fn state(&self) -> Arc<dyn StateAdapter> {
        Arc::clone(&self.inner.state)
    }

    pub fn get_adapter(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        self.inner.adapters.get(name).cloned()
    }

    /// Registered adapter names, sorted.
    pub fn adapter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.adapters.keys().cloned().collect();
        names.sort();
        names
    }

    /// A child of the dispatcher logger, e.g. `chat:slack`.
    pub fn logger(&self, prefix: &str) -> Logger {
        self.inner.logger.child(prefix)
    }

    /// A reviver bound to this dispatcher.
    pub fn reviver(&self) -> Reviver {
        Reviver::new(self.clone())
    }

    /// Makes this dispatcher the one deserialized threads and channels bind to.
    pub fn register_singleton(&self) {
        singleton::register(self);
    }

    pub fn singleton() -> Result<Chat, ChatError> {
        singleton::current()
    }

    pub fn clear_singleton() {
        singleton::clear();
    }

    fn adapter_or_err(&self, name: &str) -> Result<Arc<dyn Adapter>, ChatError> {
        self.get_adapter(name)
            .ok_or_else(|| ChatError::AdapterNotFound {
                name: name.to_string(),
            })
    }

    pub(crate) fn binding(&self, adapter_name: &str) -> Result<Binding, ChatError> {
        Ok(Binding {
            adapter: self.adapter_or_err(adapter_name)?,
            state: Arc::clone(&self.inner.state),
            streaming_update_interval: self.inner.streaming_update_interval,
            logger: self.inner.logger.clone(),
        })
    }

    /// Adapter name from the prefix of a thread or channel ID.
    fn binding_for_id(&self, id: &str) -> Result<Binding, ChatError> {
        let prefix = id.split(':').next().unwrap_or_default();
        self.binding(prefix)
    }

    // --- proactive messaging ---------------------------------------------

    /// A live thread for proactive posting.
    pub fn thread(&self, thread_id: &str) -> Result<Thread, ChatError> {
        let binding = self.binding_for_id(thread_id)?;
        Ok(Thread::bound(binding, thread_id, ThreadContext::default()))
    }

    /// A live channel for proactive posting.
    pub fn channel(&self, channel_id: &str) -> Result<Channel, ChatError> {
        let binding = self.binding_for_id(channel_id)?;
        let is_dm = binding.adapter.is_dm(channel_id);
        Ok(Channel::bound(binding, channel_id, is_dm))
    }

    /// Opens a DM with a user, inferring the platform from the ID format.
    pub async fn open_dm(&self, user: impl Into<UserRef>) -> Result<Thread, ChatError> {
        let user = user.into();
        let user_id = user.user_id();
        let adapter = self.infer_adapter(user_id)?;
        let thread_id = adapter.open_dm(user_id).await?;
        let binding = self.binding(adapter.name())?;
        Ok(Thread::bound(binding, &thread_id, ThreadContext::default()))
    }

    fn infer_adapter(&self, user_id: &str) -> Result<Arc<dyn Adapter>, ChatError> {
        let candidates: [(&Regex, &str); 4] = [
            (&*GCHAT_USER, "gchat"),
            (&*TEAMS_USER, "teams"),
            (&*SLACK_USER, "slack"),
            (&*DISCORD_USER, "discord"),
        ];
        candidates
            .iter()
            .filter(|(pattern, _)| pattern.is_match(user_id))
            .find_map(|(_, name)| self.get_adapter(name))
            .ok_or_else(|| ChatError::UnknownUserIdFormat {
                user_id: user_id.to_string(),
            })
    }

    // --- message pipeline ------------------------------------------------

    /// Deduplicates, locks the thread, and runs the matching handlers.
    ///
    /// Messages the bot sent itself are dropped before any state access. A
    /// contended lock fails with [`ChatError::Lock`]; the lock is released
    /// whatever the handlers do, including panicking.
    pub async fn handle_incoming_message(
        &self,
        adapter_name: &str,
        thread_id: &str,
        message: Message,
    ) -> Result<(), ChatError> {
        if message.author.is_me {
            return Ok(());
        }
        let binding = self.binding(adapter_name)?;
        let state = &self.inner.state;

        let key = dedupe_key(adapter_name, &message.id);
        if state.get(&key).await?.is_some() {
            self.inner
                .logger
                .debug(format!("skipping duplicate message {}", message.id));
            return Ok(());
        }
        state
            .set(&key, serde_json::Value::Bool(true), Some(self.inner.dedupe_ttl))
            .await?;

        let lock = state
            .acquire_lock(thread_id, self.inner.lock_ttl)
            .await?
            .ok_or_else(|| ChatError::Lock {
                thread_id: thread_id.to_string(),
            })?;

        let outcome = AssertUnwindSafe(self.dispatch_message(binding, thread_id, message))
            .catch_unwind()
            .await;

        if let Err(e) = state.release_lock(&lock).await {
            self.inner
                .logger
                .warn(format!("failed to release lock on {thread_id}: {e}"));
        }

        match outcome {
            Ok(result) => result,
            Err(panic) => Err(ChatError::Handler {
                source: panic_message(panic).into(),
            }),
        }
    }

    async fn dispatch_message(
        &self,
        binding: Binding,
        thread_id: &str,
        mut message: Message,
    ) -> Result<(), ChatError> {
        if message.is_mention.is_none() {
            let adapter = binding.adapter.as_ref();
            let user_name = match adapter.user_name() {
                "" => self.inner.user_name.as_str(),
                name => name,
            };
            message.is_mention = Some(detect_mention(
                user_name,
                adapter.bot_user_id(),
                &message.text,
            ));
        }

        let is_subscribed = self.inner.state.is_subscribed(thread_id).await?;
        let thread = Thread::bound(
            binding,
            thread_id,
            ThreadContext {
                is_subscribed,
                current_message: Some(message.clone()),
            },
        );

        let handlers = if is_subscribed {
            self.inner.handlers.subscribed()
        } else if message.mentions_bot() {
            self.inner.handlers.mention()
        } else {
            self.inner.handlers.patterns_matching(&message.text)
        };

        for handler in handlers {
            handler(thread.clone(), message.clone()).await?;
        }
        Ok(())
    }

    /// A thread for a non-message event, with its subscription looked up.
    async fn event_thread(
        &self,
        binding: &Binding,
        thread_id: &str,
        message: Option<Message>,
    ) -> Result<Thread, ChatError> {
        let is_subscribed = self.inner.state.is_subscribed(thread_id).await?;
        Ok(Thread::bound(
            binding.clone(),
            thread_id,
            ThreadContext {
                is_subscribed,
                current_message: message,
            },
        ))
    }

    // --- process_* entry points --------------------------------------------

    /// Runs `task` through `wait_until` when provided, otherwise on the
    /// runtime. Failures are logged.
    fn run_task<Fut>(&self, options: WebhookOptions, what: &'static str, task: Fut)
    where
        Fut: Future<Output = Result<(), ChatError>> + Send + 'static,
    {
        let logger = self.inner.logger.clone();
        let task = async move {
            match task.await {
                Ok(()) => {}
                Err(e @ ChatError::Lock { .. }) => logger.warn(format!("{what}: {e}")),
                Err(e) => logger.error(format!("{what} failed: {e}")),
            }
        }
        .boxed();

        match options.wait_until {
            Some(wait_until) => wait_until(task),
            None => {
                tokio::spawn(task);
            }
        }
    }

    pub fn process_message(
        &self,
        adapter_name: &str,
        thread_id: &str,
        message: MessageSource,
        options: WebhookOptions,
    ) {
        let chat = self.clone();
        let adapter_name = adapter_name.to_string();
        let thread_id = thread_id.to_string();
        self.run_task(options, "message processing", async move {
            let message = message.resolve().await?;
            chat.handle_incoming_message(&adapter_name, &thread_id, message)
                .await
        });
    }

    pub fn process_reaction(&self, adapter_name: &str, event: ReactionEvent, options: WebhookOptions) {
        let chat = self.clone();
        let adapter_name = adapter_name.to_string();
        self.run_task(options, "reaction processing", async move {
            chat.handle_reaction(&adapter_name, event).await
        });
    }

    pub fn process_action(&self, adapter_name: &str, event: ActionEvent, options: WebhookOptions) {
        let chat = self.clone();
        let adapter_name = adapter_name.to_string();
        self.run_task(options, "action processing", async move {
            chat.handle_action(&adapter_name, event).await
        });
    }

    /// Runs modal-submit handlers in place and returns the first response.
    ///
    /// A failing handler is logged and the next one still runs.
    pub async fn process_modal_submit(
        &self,
        adapter_name: &str,
        event: ModalSubmitEvent,
    ) -> Option<ModalResponse> {
        match self.handle_modal_submit(adapter_name, event).await {
            Ok(response) => response,
            Err(e) => {
                self.inner
                    .logger
                    .error(format!("modal submit processing failed: {e}"));
                None
            }
        }
    }

    pub fn process_modal_close(
        &self,
        adapter_name: &str,
        event: ModalCloseEvent,
        options: WebhookOptions,
    ) {
        let chat = self.clone();
        let adapter_name = adapter_name.to_string();
        self.run_task(options, "modal close processing", async move {
            chat.handle_modal_close(&adapter_name, event).await
        });
    }

    async fn handle_reaction(&self, adapter_name: &str, event: ReactionEvent) -> Result<(), ChatError> {
        if event.user.is_me {
            return Ok(());
        }
        let handlers = self
            .inner
            .handlers
            .reactions_for(&event.emoji, &event.raw_emoji);
        if handlers.is_empty() {
            return Ok(());
        }

        let binding = self.binding(adapter_name)?;
        let thread = self
            .event_thread(&binding, &event.thread_id, event.message.clone())
            .await?;
        let context = ReactionContext {
            event,
            thread,
            adapter: binding.adapter,
        };
        for handler in handlers {
            handler(context.clone()).await?;
        }
        Ok(())
    }

    async fn handle_action(&self, adapter_name: &str, event: ActionEvent) -> Result<(), ChatError> {
        if event.user.is_me {
            return Ok(());
        }
        let handlers = self.inner.handlers.actions_for(&event.action_id);
        if handlers.is_empty() {
            return Ok(());
        }

        let binding = self.binding(adapter_name)?;
        let thread = self
            .event_thread(&binding, &event.thread_id, event.message.clone())
            .await?;
        let context = ActionContext {
            event,
            thread,
            binding,
        };
        for handler in handlers {
            handler(context.clone()).await?;
        }
        Ok(())
    }

    async fn handle_modal_submit(
        &self,
        adapter_name: &str,
        event: ModalSubmitEvent,
    ) -> Result<Option<ModalResponse>, ChatError> {
        if event.user.is_me {
            return Ok(None);
        }
        let handlers = self.inner.handlers.modal_submits_for(&event.callback_id);
        if handlers.is_empty() {
            return Ok(None);
        }

        let binding = self.binding(adapter_name)?;
        let (related_thread, related_message) = self
            .related_context(&binding, event.context_id.as_deref())
            .await;
        let context = ModalSubmitContext {
            event,
            related_thread,
            related_message,
            adapter: binding.adapter,
        };
        for handler in handlers {
            match handler(context.clone()).await {
                Ok(Some(response)) => return Ok(Some(response)),
                Ok(None) => {}
                Err(e) => self
                    .inner
                    .logger
                    .error(format!("modal submit handler failed: {e}")),
            }
        }
        Ok(None)
    }

    async fn handle_modal_close(
        &self,
        adapter_name: &str,
        event: ModalCloseEvent,
    ) -> Result<(), ChatError> {
        if event.user.is_me {
            return Ok(());
        }
        let handlers = self.inner.handlers.modal_closes_for(&event.callback_id);
        if handlers.is_empty() {
            return Ok(());
        }

        let binding = self.binding(adapter_name)?;
        let (related_thread, related_message) = self
            .related_context(&binding, event.context_id.as_deref())
            .await;
        let context = ModalCloseContext {
            event,
            related_thread,
            related_message,
            adapter: binding.adapter,
        };
        for handler in handlers {
            handler(context.clone()).await?;
        }
        Ok(())
    }

    async fn related_context(
        &self,
        binding: &Binding,
        context_id: Option<&str>,
    ) -> (Option<Thread>, Option<crate::sent::SentMessage>) {
        match restore_modal_context(binding, context_id).await {
            Ok(related) => related,
            Err(e) => {
                self.inner
                    .logger
                    .warn(format!("failed to restore modal context: {e}"));
                (None, None)
            }
        }
    }
}

impl std::fmt::Debug for Chat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chat")
            .field("user_name", &self.inner.user_name)
            .field("adapters", &self.adapter_names())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}

/// The dispatcher adapters hold.
///
/// Keeps only a weak reference to the [`Chat`] so adapters stored inside the
/// dispatcher do not keep it alive.
struct ChatHandle {
    chat: Weak<ChatInner>,
    user_name: String,
    state: Arc<dyn StateAdapter>,
    logger: Logger,
}

impl ChatHandle {
    fn new(chat: &Chat) -> Self {
        Self {
            chat: Arc::downgrade(&chat.inner),
            user_name: chat.inner.user_name.clone(),
            state: Arc::clone(&chat.inner.state),
            logger: chat.inner.logger.clone(),
        }
    }

    fn upgrade(&self) -> Option<Chat> {
        let chat = self.chat.upgrade().map(|inner| Chat { inner });
        if chat.is_none() {
            self.logger.warn("event dropped: chat has been dropped");
        }
        chat
    }
}

#[async_trait]
impl Dispatcher for ChatHandle {
    fn user_name(&self) -> &str {
        &self.user_name
    }

    fn state(&self) -> Arc<dyn StateAdapter> {
        Arc::clone(&self.state)
    }

    fn logger(&self, prefix: &str) -> Logger {
        self.logger.child(prefix)
    }

    fn process_message(
        &self,
        adapter: &str,
        thread_id: &str,
        message: MessageSource,
        options: WebhookOptions,
    ) {
        if let Some(chat) = self.upgrade() {
            chat.process_message(adapter, thread_id, message, options);
        }
    }

    fn process_reaction(&self, adapter: &str, event: ReactionEvent, options: WebhookOptions) {
        if let Some(chat) = self.upgrade() {
            chat.process_reaction(adapter, event, options);
        }
    }

    fn process_action(&self, adapter: &str, event: ActionEvent, options: WebhookOptions) {
        if let Some(chat) = self.upgrade() {
            chat.process_action(adapter, event, options);
        }
    }

    async fn process_modal_submit(
        &self,
        adapter: &str,
        event: ModalSubmitEvent,
        _options: WebhookOptions,
    ) -> Option<ModalResponse> {
        let chat = self.upgrade()?;
        chat.process_modal_submit(adapter, event).await
    }

    fn process_modal_close(&self, adapter: &str, event: ModalCloseEvent, options: WebhookOptions) {
        if let Some(chat) = self.upgrade() {
            chat.process_modal_close(adapter, event, options);
        }
    }
}
