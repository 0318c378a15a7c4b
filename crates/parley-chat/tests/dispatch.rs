// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the message pipeline and event dispatch.
//!
//! Each test builds its own dispatcher over a `MockAdapter` named `p` and an
//! in-memory state backend. Background tasks are collected through
//! `wait_until` and drained explicitly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use regex::Regex;
use serde_json::json;
use tracing_test::traced_test;

use parley_chat::{Chat, ChatConfig, EmojiFilter, HandlerResult, Thread};
use parley_core::events::{
    ActionEvent, MessageSource, ModalCloseEvent, ModalResponse, ModalSubmitEvent, ReactionEvent,
};
use parley_core::postable::ModalElement;
use parley_core::types::{AdapterCapabilities, StreamOptions};
use parley_core::{ChatError, Dispatcher, EmojiValue, HandlerError, LogLevel, Message, StateAdapter};
use parley_test_utils::{
    AdapterCall, MemoryState, MockAdapter, TaskCollector, author, bot_author, bot_message,
    user_message,
};

const THREAD: &str = "p:C1:t1";

struct Harness {
    chat: Chat,
    adapter: Arc<MockAdapter>,
    state: Arc<MemoryState>,
    tasks: TaskCollector,
}

fn harness() -> Harness {
    harness_with(MockAdapter::new("p").with_all_capabilities())
}

fn harness_with(adapter: MockAdapter) -> Harness {
    let adapter = Arc::new(adapter);
    let state = Arc::new(MemoryState::new());
    let chat = Chat::new(
        ChatConfig::new("bot", state.clone())
            .adapter(adapter.clone())
            .logger(LogLevel::Debug),
    );
    Harness {
        chat,
        adapter,
        state,
        tasks: TaskCollector::new(),
    }
}

fn handled() -> HandlerResult {
    Ok(())
}

/// A handler counter plus the messages it saw.
#[derive(Clone, Default)]
struct Seen {
    count: Arc<AtomicUsize>,
    messages: Arc<Mutex<Vec<Message>>>,
}

impl Seen {
    fn record(&self, message: &Message) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().unwrap().push(message.clone());
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn last(&self) -> Message {
        self.messages.lock().unwrap().last().cloned().unwrap()
    }
}

fn on_mention(chat: &Chat) -> Seen {
    let seen = Seen::default();
    let sink = seen.clone();
    chat.on_new_mention(move |_, message| {
        sink.record(&message);
        async { handled() }
    });
    seen
}

fn on_subscribed(chat: &Chat) -> Seen {
    let seen = Seen::default();
    let sink = seen.clone();
    chat.on_subscribed_message(move |_, message| {
        sink.record(&message);
        async { handled() }
    });
    seen
}

fn on_pattern(chat: &Chat, pattern: &str) -> Seen {
    let seen = Seen::default();
    let sink = seen.clone();
    chat.on_new_message(Regex::new(pattern).unwrap(), move |_, message| {
        sink.record(&message);
        async { handled() }
    });
    seen
}

async fn failing_handler(_: Thread, _: Message) -> HandlerResult {
    Err("kaboom".into())
}

async fn exploding_handler(_: Thread, _: Message) -> HandlerResult {
    panic!("handler exploded")
}

// ---- Test 1: Self-filter ----

#[tokio::test]
async fn test_self_authored_messages_touch_nothing() {
    let h = harness();
    let mention = on_mention(&h.chat);
    let pattern = on_pattern(&h.chat, ".*");

    h.chat
        .handle_incoming_message("p", THREAD, bot_message("m1", THREAD, "@bot hi"))
        .await
        .unwrap();

    assert_eq!(h.state.op_count(), 0);
    assert!(h.adapter.calls().await.is_empty());
    assert_eq!(mention.count() + pattern.count(), 0);
}

// ---- Test 2: Mention scenario and dedup ----

#[tokio::test]
async fn test_mention_fires_once_and_duplicates_are_skipped() {
    let h = harness();
    let mention = on_mention(&h.chat);
    let subscribed = on_subscribed(&h.chat);
    let pattern = on_pattern(&h.chat, "help");

    let message = user_message("m1", THREAD, "Hey @bot help");
    h.chat
        .handle_incoming_message("p", THREAD, message.clone())
        .await
        .unwrap();
    h.chat
        .handle_incoming_message("p", THREAD, message)
        .await
        .unwrap();

    assert_eq!(mention.count(), 1);
    assert_eq!(mention.last().is_mention, Some(true));
    assert_eq!(subscribed.count(), 0);
    assert_eq!(pattern.count(), 0);
    assert!(h.state.get("dedupe:p:m1").await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_redelivery_after_dedupe_ttl_is_processed_again() {
    let h = harness();
    let mention = on_mention(&h.chat);
    let message = user_message("m1", THREAD, "@bot ping");

    h.chat
        .handle_incoming_message("p", THREAD, message.clone())
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    h.chat
        .handle_incoming_message("p", THREAD, message.clone())
        .await
        .unwrap();
    assert_eq!(mention.count(), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    h.chat
        .handle_incoming_message("p", THREAD, message)
        .await
        .unwrap();
    assert_eq!(mention.count(), 2);
}

#[tokio::test]
async fn test_adapter_supplied_mention_flag_is_kept() {
    let h = harness();
    let mention = on_mention(&h.chat);
    let pattern = on_pattern(&h.chat, "deploy");

    let message = user_message("m1", THREAD, "deploy please").with_mention(true);
    h.chat
        .handle_incoming_message("p", THREAD, message)
        .await
        .unwrap();

    assert_eq!(mention.count(), 1);
    assert_eq!(pattern.count(), 0);
}

// ---- Test 3: Locking ----

#[tokio::test]
async fn test_contended_lock_fails_without_running_handlers() {
    let h = harness();
    let mention = on_mention(&h.chat);
    h.state.set_deny_locks(true);

    let err = h
        .chat
        .handle_incoming_message("p", THREAD, user_message("m1", THREAD, "@bot hi"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "LOCK_FAILED");
    assert_eq!(mention.count(), 0);
}

#[tokio::test]
async fn test_lock_is_released_when_handler_fails() {
    let h = harness();
    h.chat.on_new_mention(failing_handler);

    let err = h
        .chat
        .handle_incoming_message("p", THREAD, user_message("m1", THREAD, "@bot hi"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "HANDLER_FAILED");
    assert!(err.to_string().contains("kaboom"));
    assert_eq!(h.state.release_count(), 1);
    assert!(!h.state.is_locked(THREAD));
}

#[tokio::test]
async fn test_lock_is_released_when_handler_panics() {
    let h = harness();
    h.chat.on_new_mention(exploding_handler);

    let err = h
        .chat
        .handle_incoming_message("p", THREAD, user_message("m1", THREAD, "@bot hi"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "HANDLER_FAILED");
    assert!(err.to_string().contains("handler exploded"));
    assert!(!h.state.is_locked(THREAD));
}

#[tokio::test]
async fn test_failing_handler_stops_later_handlers() {
    let h = harness();
    h.chat.on_new_mention(failing_handler);
    let later = on_mention(&h.chat);

    let _ = h
        .chat
        .handle_incoming_message("p", THREAD, user_message("m1", THREAD, "@bot hi"))
        .await;
    assert_eq!(later.count(), 0);
}

// ---- Test 4: Classification ----

#[tokio::test]
async fn test_subscribed_thread_only_reaches_subscribed_handlers() {
    let h = harness();
    let mention = on_mention(&h.chat);
    let subscribed = on_subscribed(&h.chat);
    let pattern = on_pattern(&h.chat, "help");
    h.state.subscribe(THREAD).await.unwrap();

    h.chat
        .handle_incoming_message("p", THREAD, user_message("m1", THREAD, "Hey @bot help"))
        .await
        .unwrap();

    assert_eq!(subscribed.count(), 1);
    assert_eq!(subscribed.last().is_mention, Some(true));
    assert_eq!(mention.count(), 0);
    assert_eq!(pattern.count(), 0);
}

#[tokio::test]
async fn test_every_matching_pattern_fires() {
    let h = harness();
    let first = on_pattern(&h.chat, "deploy");
    let second = on_pattern(&h.chat, "(?i)DEPLOY to prod");
    let third = on_pattern(&h.chat, "rollback");
    let mention = on_mention(&h.chat);

    h.chat
        .handle_incoming_message("p", THREAD, user_message("m1", THREAD, "deploy to prod"))
        .await
        .unwrap();

    assert_eq!(first.count(), 1);
    assert_eq!(second.count(), 1);
    assert_eq!(third.count(), 0);
    assert_eq!(mention.count(), 0);
}

#[tokio::test]
async fn test_subscribing_routes_follow_ups_to_subscribed_handlers() {
    let h = harness();
    let subscribed = on_subscribed(&h.chat);
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = observed.clone();
    h.chat.on_new_mention(move |thread, _| {
        let sink = sink.clone();
        async move {
            let is_subscribed = thread.is_subscribed().await?;
            sink.lock().unwrap().push(is_subscribed);
            thread.subscribe().await?;
            thread.post("Subscribed!").await?;
            handled()
        }
    });

    h.chat
        .handle_incoming_message("p", THREAD, user_message("m1", THREAD, "@bot watch"))
        .await
        .unwrap();
    h.chat
        .handle_incoming_message("p", THREAD, user_message("m2", THREAD, "anything"))
        .await
        .unwrap();

    assert_eq!(*observed.lock().unwrap(), vec![false]);
    assert_eq!(subscribed.count(), 1);
    assert_eq!(subscribed.last().id, "m2");
    let calls = h.adapter.calls().await;
    assert!(calls.contains(&AdapterCall::Subscribe {
        thread_id: THREAD.into()
    }));
}

#[tokio::test]
async fn test_subscribed_context_short_circuits_state() {
    let h = harness();
    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = results.clone();
    let state = h.state.clone();
    h.chat.on_subscribed_message(move |thread, _| {
        let sink = sink.clone();
        let state = state.clone();
        async move {
            let before = state.op_count();
            let subscribed = thread.is_subscribed().await?;
            sink.lock().unwrap().push((subscribed, state.op_count() - before));
            handled()
        }
    });
    h.state.subscribe(THREAD).await.unwrap();

    h.chat
        .handle_incoming_message("p", THREAD, user_message("m1", THREAD, "hello"))
        .await
        .unwrap();

    assert_eq!(*results.lock().unwrap(), vec![(true, 0)]);
}

// ---- Test 5: Webhooks and background tasks ----

fn webhook(message: &Message) -> http::Request<Bytes> {
    let body = serde_json::to_vec(&json!({ "threadId": THREAD, "message": message })).unwrap();
    http::Request::post("/webhooks/p")
        .body(Bytes::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_webhook_initializes_and_defers_processing() {
    let h = harness();
    let mention = on_mention(&h.chat);

    let response = h
        .chat
        .handle_webhook(
            "p",
            webhook(&user_message("m1", THREAD, "@bot hi")),
            h.tasks.options(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), http::StatusCode::OK);
    assert_eq!(h.adapter.initialize_count(), 1);
    assert_eq!(h.tasks.pending(), 1);
    assert_eq!(mention.count(), 0);

    h.tasks.drain().await;
    assert_eq!(mention.count(), 1);
}

#[tokio::test]
async fn test_webhook_for_unknown_adapter_fails() {
    let h = harness();
    let err = h
        .chat
        .handle_webhook(
            "nope",
            webhook(&user_message("m1", THREAD, "hi")),
            h.tasks.options(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ADAPTER_NOT_FOUND");
    assert_eq!(h.adapter.initialize_count(), 0);
}

#[tokio::test]
async fn test_initialize_is_idempotent_and_restartable() {
    let h = harness();
    let (a, b) = tokio::join!(h.chat.initialize(), h.chat.initialize());
    a.unwrap();
    b.unwrap();
    h.chat.initialize().await.unwrap();
    assert_eq!(h.adapter.initialize_count(), 1);

    h.chat.shutdown().await.unwrap();
    h.chat.initialize().await.unwrap();
    assert_eq!(h.adapter.initialize_count(), 2);
}

#[tokio::test]
async fn test_deferred_message_source_resolves_inside_the_task() {
    let h = harness();
    let mention = on_mention(&h.chat);
    h.chat.initialize().await.unwrap();

    let dispatcher = h.adapter.dispatcher().unwrap();
    let message = user_message("m1", THREAD, "@bot later");
    dispatcher.process_message(
        "p",
        THREAD,
        MessageSource::Deferred(Box::pin(async move { Ok::<_, ChatError>(message) })),
        h.tasks.options(),
    );
    assert_eq!(mention.count(), 0);

    h.tasks.drain().await;
    assert_eq!(mention.count(), 1);
    assert_eq!(dispatcher.user_name(), "bot");
}

#[tokio::test]
async fn test_processing_without_wait_until_is_spawned() {
    let h = harness();
    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    h.chat.on_new_mention(move |_, message| {
        if let Some(tx) = tx.lock().unwrap().take() {
            let _ = tx.send(message.id.clone());
        }
        async { handled() }
    });

    h.chat.process_message(
        "p",
        THREAD,
        user_message("m1", THREAD, "@bot spawn").into(),
        Default::default(),
    );
    let id = tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, "m1");
}

#[tokio::test]
#[traced_test]
async fn test_handler_errors_are_logged_not_returned() {
    let h = harness();
    h.chat.on_new_mention(failing_handler);

    h.chat.process_message(
        "p",
        THREAD,
        user_message("m1", THREAD, "@bot hi").into(),
        h.tasks.options(),
    );
    h.tasks.drain().await;

    assert!(logs_contain("message processing failed"));
    assert!(logs_contain("kaboom"));
}

#[tokio::test]
#[traced_test]
async fn test_lock_contention_is_logged_as_warning() {
    let h = harness();
    on_mention(&h.chat);
    h.state.set_deny_locks(true);

    h.chat.process_message(
        "p",
        THREAD,
        user_message("m1", THREAD, "@bot hi").into(),
        h.tasks.options(),
    );
    h.tasks.drain().await;

    assert!(logs_contain("failed to acquire lock on thread p:C1:t1"));
}

#[tokio::test]
#[traced_test]
async fn test_silent_logger_suppresses_output() {
    let adapter = Arc::new(MockAdapter::new("p"));
    let chat = Chat::new(
        ChatConfig::new("bot", Arc::new(MemoryState::new()))
            .adapter(adapter)
            .logger(LogLevel::Silent),
    );
    let tasks = TaskCollector::new();
    chat.on_new_mention(failing_handler);

    chat.process_message(
        "p",
        THREAD,
        user_message("m1", THREAD, "@bot hi").into(),
        tasks.options(),
    );
    tasks.drain().await;

    assert!(!logs_contain("kaboom"));
}

// ---- Test 6: Reactions and actions ----

fn reaction(emoji: &str, raw: &str, user: parley_core::Author) -> ReactionEvent {
    ReactionEvent {
        emoji: EmojiValue::new(emoji),
        raw_emoji: raw.into(),
        added: true,
        user,
        message_id: "m1".into(),
        thread_id: THREAD.into(),
        message: None,
        raw: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn test_reaction_filters_match_any_representation() {
    let h = harness();
    let hits = Arc::new(Mutex::new(Vec::new()));
    let filters: Vec<(&str, Vec<EmojiFilter>)> = vec![
        ("normalized", vec!["thumbs_up".into()]),
        ("raw", vec!["+1".into()]),
        ("value", vec![EmojiValue::new("thumbs_up").into()]),
        ("other", vec![EmojiValue::new("eyes").into(), "heart".into()]),
        ("all", vec![]),
    ];
    for (label, filter) in filters {
        let hits = hits.clone();
        h.chat.on_reaction_matching(filter, move |ctx| {
            assert!(ctx.added());
            hits.lock().unwrap().push(label);
            async { handled() }
        });
    }

    h.chat
        .process_reaction("p", reaction("thumbs_up", "+1", author("U1", "alice")), h.tasks.options());
    h.tasks.drain().await;

    assert_eq!(
        *hits.lock().unwrap(),
        vec!["normalized", "raw", "value", "all"]
    );
}

#[tokio::test]
async fn test_own_reactions_are_ignored() {
    let h = harness();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    h.chat.on_reaction(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { handled() }
    });

    h.chat
        .process_reaction("p", reaction("eyes", "eyes", bot_author()), h.tasks.options());
    h.tasks.drain().await;

    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(h.state.op_count(), 0);
}

fn action(action_id: &str, trigger_id: Option<&str>) -> ActionEvent {
    ActionEvent {
        action_id: action_id.into(),
        value: Some("42".into()),
        user: author("U1", "alice"),
        message_id: "m1".into(),
        thread_id: THREAD.into(),
        trigger_id: trigger_id.map(str::to_string),
        message: Some(user_message("m1", THREAD, "Deploy v2?")),
        raw: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn test_actions_dispatch_by_id() {
    let h = harness();
    let hits = Arc::new(Mutex::new(Vec::new()));

    let sink = hits.clone();
    h.chat.on_action_matching(["approve"], move |ctx| {
        sink.lock()
            .unwrap()
            .push(format!("approve:{}", ctx.value().unwrap_or_default()));
        async { handled() }
    });
    let sink = hits.clone();
    h.chat.on_action(move |ctx| {
        sink.lock().unwrap().push(format!("any:{}", ctx.action_id()));
        async { handled() }
    });

    for action_id in ["approve", "reject"] {
        h.chat
            .process_action("p", action(action_id, None), h.tasks.options());
        h.tasks.drain().await;
    }

    assert_eq!(
        *hits.lock().unwrap(),
        vec!["approve:42", "any:approve", "any:reject"]
    );
}

#[tokio::test]
async fn test_action_handlers_can_reply_in_thread() {
    let h = harness();
    h.chat.on_action(|ctx| async move {
        ctx.thread.post(format!("{} clicked", ctx.user().user_name)).await?;
        handled()
    });

    h.chat.process_action("p", action("approve", None), h.tasks.options());
    h.tasks.drain().await;

    assert_eq!(
        h.adapter.calls().await,
        vec![AdapterCall::Post {
            thread_id: THREAD.into(),
            message: parley_core::AdapterPostableMessage::Text("alice clicked".into()),
        }]
    );
}

// ---- Test 7: Modals ----

fn feedback_modal() -> ModalElement {
    ModalElement::from_value(json!({"type": "modal", "callbackId": "feedback"})).unwrap()
}

fn submit(callback_id: &str, context_id: Option<String>) -> ModalSubmitEvent {
    ModalSubmitEvent {
        callback_id: callback_id.into(),
        view_id: "V1".into(),
        values: HashMap::from([("rating".to_string(), "5".to_string())]),
        user: author("U1", "alice"),
        private_metadata: None,
        context_id,
        raw: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn test_modal_opened_from_action_carries_thread_to_submit() {
    let h = harness();
    h.chat.on_action(|ctx| async move {
        let opened = ctx.open_modal(feedback_modal()).await?;
        assert!(opened.is_some());
        handled()
    });
    let related = Arc::new(Mutex::new(None));
    let sink = related.clone();
    h.chat.on_modal_submit_matching(["feedback"], move |ctx| {
        *sink.lock().unwrap() = Some((
            ctx.related_thread.as_ref().map(|t| t.id().to_string()),
            ctx.related_message.as_ref().map(|m| m.text.clone()),
            ctx.value("rating").map(str::to_string),
        ));
        async { Ok::<_, HandlerError>(Some(ModalResponse::Close)) }
    });

    h.chat
        .process_action("p", action("feedback", Some("trigger-1")), h.tasks.options());
    h.tasks.drain().await;

    let context_id = h
        .adapter
        .calls()
        .await
        .into_iter()
        .find_map(|call| match call {
            AdapterCall::OpenModal { context_id, .. } => context_id,
            _ => None,
        })
        .unwrap();

    let response = h
        .chat
        .process_modal_submit("p", submit("feedback", Some(context_id)))
        .await;

    assert_eq!(response, Some(ModalResponse::Close));
    assert_eq!(
        related.lock().unwrap().clone().unwrap(),
        (
            Some(THREAD.to_string()),
            Some("Deploy v2?".to_string()),
            Some("5".to_string())
        )
    );
}

#[tokio::test]
#[traced_test]
async fn test_open_modal_without_support_resolves_to_none() {
    let h = harness_with(MockAdapter::new("p").with_capabilities(AdapterCapabilities::default()));
    let outcome = Arc::new(Mutex::new(None));
    let sink = outcome.clone();
    h.chat.on_action(move |ctx| {
        let sink = sink.clone();
        async move {
            *sink.lock().unwrap() = Some(ctx.open_modal(feedback_modal()).await?);
            handled()
        }
    });

    h.chat
        .process_action("p", action("feedback", Some("trigger-1")), h.tasks.options());
    h.tasks.drain().await;

    assert_eq!(*outcome.lock().unwrap(), Some(None));
    assert!(logs_contain("does not support modals"));
}

#[tokio::test]
#[traced_test]
async fn test_first_modal_response_wins_and_errors_do_not_stop_the_loop() {
    let h = harness();
    let late = Arc::new(AtomicUsize::new(0));

    h.chat
        .on_modal_submit(|_| async { Err::<Option<ModalResponse>, HandlerError>("bad input".into()) });
    h.chat
        .on_modal_submit(|_| async { Ok::<_, HandlerError>(None) });
    h.chat.on_modal_submit(|_| async {
        let errors = HashMap::from([("rating".to_string(), "Too low".to_string())]);
        Ok::<_, HandlerError>(Some(ModalResponse::Errors(errors)))
    });
    let counter = late.clone();
    h.chat.on_modal_submit(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, HandlerError>(Some(ModalResponse::Close)) }
    });

    let response = h.chat.process_modal_submit("p", submit("any", None)).await;

    match response {
        Some(ModalResponse::Errors(errors)) => assert_eq!(errors["rating"], "Too low"),
        other => panic!("unexpected response {other:?}"),
    }
    assert_eq!(late.load(Ordering::SeqCst), 0);
    assert!(logs_contain("modal submit handler failed"));
}

#[tokio::test]
async fn test_modal_submit_without_handlers_returns_none() {
    let h = harness();
    assert_eq!(
        h.chat.process_modal_submit("p", submit("feedback", None)).await,
        None
    );
}

#[tokio::test]
async fn test_modal_close_dispatches_by_callback_id() {
    let h = harness();
    let closed = Arc::new(Mutex::new(Vec::new()));
    let sink = closed.clone();
    h.chat.on_modal_close_matching(["feedback"], move |ctx| {
        sink.lock().unwrap().push(ctx.event.view_id.clone());
        async { handled() }
    });

    for callback_id in ["feedback", "survey"] {
        h.chat.process_modal_close(
            "p",
            ModalCloseEvent {
                callback_id: callback_id.into(),
                view_id: format!("V-{callback_id}"),
                user: author("U1", "alice"),
                private_metadata: None,
                context_id: None,
                raw: serde_json::Value::Null,
            },
            h.tasks.options(),
        );
    }
    h.tasks.drain().await;

    assert_eq!(*closed.lock().unwrap(), vec!["V-feedback"]);
}

// ---- Test 8: Direct messages ----

#[tokio::test]
async fn test_open_dm_infers_slack_from_user_id() {
    let adapter = Arc::new(MockAdapter::new("slack").with_all_capabilities());
    let chat = Chat::new(ChatConfig::new("bot", Arc::new(MemoryState::new())).adapter(adapter.clone()));

    let thread = chat.open_dm("U03STHCA1JM").await.unwrap();
    assert_eq!(thread.id(), "slack:DM-U03STHCA1JM");
    assert!(thread.is_dm());
    assert_eq!(thread.adapter_name(), "slack");

    thread.post("hi there").await.unwrap();
    assert_eq!(adapter.posts().await.len(), 1);
}

#[tokio::test]
async fn test_open_dm_rejects_unknown_formats() {
    let adapter = Arc::new(MockAdapter::new("slack").with_all_capabilities());
    let chat = Chat::new(ChatConfig::new("bot", Arc::new(MemoryState::new())).adapter(adapter));

    let err = chat.open_dm("invalid").await.unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_USER_ID_FORMAT");

    let err = chat.open_dm(author("29:teams-user", "tina")).await.unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_USER_ID_FORMAT");
}

// ---- Test 9: Streaming from a handler ----

#[tokio::test]
async fn test_streamed_reply_carries_recipient_hints() {
    let h = harness();
    h.chat.on_new_mention(|thread, _| async move {
        let chunks = futures::stream::iter(["Thinking", "... done"].map(|c| Ok::<_, ChatError>(c.to_string())));
        thread
            .post_stream(Box::pin(chunks), StreamOptions::default())
            .await?;
        handled()
    });

    let message = user_message("m1", THREAD, "@bot summarize").with_raw(json!({"team_id": "T1"}));
    h.chat
        .handle_incoming_message("p", THREAD, message)
        .await
        .unwrap();

    assert_eq!(
        h.adapter.calls().await,
        vec![AdapterCall::Stream {
            thread_id: THREAD.into(),
            text: "Thinking... done".into(),
            options: StreamOptions {
                recipient_user_id: Some("U1".into()),
                recipient_team_id: Some("T1".into()),
                update_interval: None,
            },
        }]
    );
}
