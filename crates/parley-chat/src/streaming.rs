// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming reply delivery.
//!
//! Adapters with native streaming receive the text stream directly. For every
//! other platform the reply is posted as a `...` placeholder and edited in
//! place as chunks arrive, throttled to one edit per interval. Draining the
//! stream and flushing edits run concurrently; a flush never overlaps the
//! previous one, and the final text is always written once the stream ends.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;

use parley_core::postable::{AdapterPostableMessage, TextStream};
use parley_core::types::StreamOptions;
use parley_core::{Adapter, ChatError, Logger};

use crate::sent::SentMessage;

/// Text of the message posted before the first chunk is flushed.
pub const PLACEHOLDER: &str = "...";

/// Default delay between fallback edits.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

pub(crate) async fn deliver(
    adapter: Arc<dyn Adapter>,
    thread_id: &str,
    stream: TextStream,
    options: StreamOptions,
    default_interval: Duration,
    logger: &Logger,
) -> Result<SentMessage, ChatError> {
    if adapter.capabilities().stream {
        deliver_native(adapter, thread_id, stream, options).await
    } else {
        let interval = options.update_interval.unwrap_or(default_interval);
        deliver_with_edits(adapter, thread_id, stream, interval, logger).await
    }
}

async fn deliver_native(
    adapter: Arc<dyn Adapter>,
    thread_id: &str,
    stream: TextStream,
    options: StreamOptions,
) -> Result<SentMessage, ChatError> {
    let accumulated = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&accumulated);
    let wrapped: TextStream = Box::pin(stream.inspect_ok(move |chunk| {
        sink.lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_str(chunk);
    }));

    let raw = adapter.stream(thread_id, wrapped, &options).await?;
    let text = std::mem::take(&mut *accumulated.lock().unwrap_or_else(|e| e.into_inner()));
    Ok(SentMessage::from_raw(adapter, raw, text))
}

async fn deliver_with_edits(
    adapter: Arc<dyn Adapter>,
    thread_id: &str,
    mut stream: TextStream,
    interval: Duration,
    logger: &Logger,
) -> Result<SentMessage, ChatError> {
    let placeholder = adapter
        .post_message(thread_id, &AdapterPostableMessage::Text(PLACEHOLDER.to_string()))
        .await?;
    let target_thread = placeholder.thread_id.clone();
    let message_id = placeholder.id.clone();

    let buffer = tokio::sync::Mutex::new(String::new());
    let finished = CancellationToken::new();

    let produce = async {
        let mut outcome = Ok(());
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => buffer.lock().await.push_str(&chunk),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        finished.cancel();
        outcome
    };

    let flush = async {
        let mut last = PLACEHOLDER.to_string();
        loop {
            tokio::select! {
                biased;
                _ = finished.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            let current = buffer.lock().await.clone();
            if current == last {
                continue;
            }
            let edit = AdapterPostableMessage::Markdown(current.clone());
            match adapter.edit_message(&target_thread, &message_id, &edit).await {
                Ok(_) => last = current,
                Err(e) => logger.debug(format!("streaming edit failed, will retry: {e}")),
            }
        }
        last
    };

    let (produced, last) = tokio::join!(produce, flush);
    let text = buffer.into_inner();
    if text != last {
        adapter
            .edit_message(
                &target_thread,
                &message_id,
                &AdapterPostableMessage::Markdown(text.clone()),
            )
            .await?;
    }
    produced?;

    Ok(SentMessage::from_raw(adapter, placeholder, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::LogLevel;
    use parley_test_utils::{AdapterCall, MockAdapter};
    use parley_core::types::AdapterCapabilities;

    fn chunks(parts: &[&str]) -> TextStream {
        let items: Vec<Result<String, ChatError>> =
            parts.iter().map(|p| Ok(p.to_string())).collect();
        Box::pin(futures::stream::iter(items))
    }

    fn logger() -> Logger {
        Logger::new("test", LogLevel::Debug)
    }

    #[tokio::test]
    async fn native_stream_accumulates_text() {
        let adapter = Arc::new(MockAdapter::new("mock").with_capabilities(AdapterCapabilities {
            stream: true,
            ..Default::default()
        }));
        let options = StreamOptions {
            recipient_user_id: Some("U1".into()),
            ..Default::default()
        };
        let sent = deliver(
            adapter.clone(),
            "mock:C1:t1",
            chunks(&["Hel", "lo"]),
            options.clone(),
            DEFAULT_UPDATE_INTERVAL,
            &logger(),
        )
        .await
        .unwrap();

        assert_eq!(sent.text, "Hello");
        assert_eq!(
            adapter.calls().await,
            vec![AdapterCall::Stream {
                thread_id: "mock:C1:t1".into(),
                text: "Hello".into(),
                options,
            }]
        );
    }

    #[tokio::test]
    async fn empty_stream_replaces_placeholder_once() {
        let adapter = Arc::new(MockAdapter::new("mock"));
        let sent = deliver(
            adapter.clone(),
            "mock:C1:t1",
            chunks(&[]),
            StreamOptions::default(),
            DEFAULT_UPDATE_INTERVAL,
            &logger(),
        )
        .await
        .unwrap();

        assert_eq!(sent.text, "");
        assert_eq!(
            adapter.posts().await,
            vec![AdapterPostableMessage::Text("...".into())]
        );
        assert_eq!(
            adapter.edits().await,
            vec![AdapterPostableMessage::Markdown(String::new())]
        );
    }

    #[tokio::test]
    async fn stream_error_still_flushes_then_fails() {
        let adapter = Arc::new(MockAdapter::new("mock"));
        let items: Vec<Result<String, ChatError>> = vec![
            Ok("partial".into()),
            Err(ChatError::adapter("upstream closed")),
        ];
        let err = deliver(
            adapter.clone(),
            "mock:C1:t1",
            Box::pin(futures::stream::iter(items)),
            StreamOptions::default(),
            DEFAULT_UPDATE_INTERVAL,
            &logger(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), "ADAPTER_ERROR");
        assert_eq!(
            adapter.edits().await,
            vec![AdapterPostableMessage::Markdown("partial".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fast_chunks_are_coalesced() {
        let adapter = Arc::new(MockAdapter::new("mock"));
        let stream: TextStream = Box::pin(futures::stream::unfold(0u32, |i| async move {
            if i == 10 {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            Some((Ok(format!("{i}")), i + 1))
        }));

        let sent = deliver(
            adapter.clone(),
            "mock:C1:t1",
            stream,
            StreamOptions::default(),
            DEFAULT_UPDATE_INTERVAL,
            &logger(),
        )
        .await
        .unwrap();

        let edits = adapter.edits().await;
        assert_eq!(sent.text, "0123456789");
        assert!(edits.len() < 10, "expected coalescing, got {} edits", edits.len());
        assert_eq!(
            edits.last(),
            Some(&AdapterPostableMessage::Markdown("0123456789".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_edits_do_not_abort_the_stream() {
        let adapter = Arc::new(MockAdapter::new("mock"));
        adapter.set_fail_edits(true);
        let stream: TextStream = Box::pin(futures::stream::unfold(0u32, |i| async move {
            if i == 3 {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(400)).await;
            Some((Ok("x".to_string()), i + 1))
        }));

        // The final flush propagates its error; intermediate ones are swallowed.
        let err = deliver(
            adapter.clone(),
            "mock:C1:t1",
            stream,
            StreamOptions::default(),
            DEFAULT_UPDATE_INTERVAL,
            &logger(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "ADAPTER_ERROR");
        assert!(adapter.edits().await.len() >= 2);
    }

    #[tokio::test]
    async fn per_call_interval_overrides_default() {
        let adapter = Arc::new(MockAdapter::new("mock"));
        let options = StreamOptions {
            update_interval: Some(Duration::from_secs(3600)),
            ..Default::default()
        };
        deliver(
            adapter.clone(),
            "mock:C1:t1",
            chunks(&["a", "b"]),
            options,
            Duration::from_millis(1),
            &logger(),
        )
        .await
        .unwrap();
        // Only the final flush ran.
        assert_eq!(adapter.edits().await.len(), 1);
    }
}
