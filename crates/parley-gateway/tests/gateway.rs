// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route tests for the webhook gateway, driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use parley_chat::{Chat, ChatConfig};
use parley_core::{AdapterPostableMessage, HandlerError};
use parley_gateway::{GatewayState, router, serve_listener};
use parley_test_utils::{MemoryState, MockAdapter, user_message};

const THREAD: &str = "slack:C1:t1";

fn setup() -> (GatewayState, Arc<MockAdapter>) {
    let adapter = Arc::new(MockAdapter::new("slack"));
    let chat = Chat::new(
        ChatConfig::new("bot", Arc::new(MemoryState::new()))
            .adapter(adapter.clone())
            .adapter(Arc::new(MockAdapter::new("discord"))),
    );
    chat.on_new_mention(|thread, message| async move {
        thread.post(format!("echo: {}", message.text)).await?;
        Ok::<_, HandlerError>(())
    });
    (GatewayState::new(chat), adapter)
}

fn webhook(adapter: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/webhooks/{adapter}"))
        .header("Content-Type", "application/json")
        .body(body.into())
        .unwrap()
}

fn mention_payload() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "threadId": THREAD,
        "message": user_message("m1", THREAD, "@bot deploy"),
    }))
    .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ---- Test 1: Webhook routing ----

#[tokio::test]
async fn test_webhook_reaches_adapter_and_handler() {
    let (state, adapter) = setup();
    let app = router(state.clone(), 1024 * 1024);

    let response = app.oneshot(webhook("slack", mention_payload())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(adapter.initialize_count(), 1);

    state.tasks.close();
    state.tasks.wait().await;

    let posts = adapter.posts().await;
    assert_eq!(
        posts,
        vec![AdapterPostableMessage::Text("echo: @bot deploy".to_string())]
    );
}

#[tokio::test]
async fn test_unknown_adapter_is_404() {
    let (state, adapter) = setup();
    let app = router(state, 1024 * 1024);

    let response = app.oneshot(webhook("teams", "{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "ADAPTER_NOT_FOUND");
    assert_eq!(adapter.initialize_count(), 0);
}

#[tokio::test]
async fn test_adapter_response_is_passed_through() {
    let (state, _) = setup();
    let app = router(state, 1024 * 1024);

    let response = app.oneshot(webhook("slack", "not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (state, adapter) = setup();
    let app = router(state, 16);

    let response = app.oneshot(webhook("slack", mention_payload())).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(adapter.initialize_count(), 0);
}

// ---- Test 2: Health ----

#[tokio::test]
async fn test_health_lists_adapters() {
    let (state, _) = setup();
    let app = router(state, 1024);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"status": "ok", "adapters": ["discord", "slack"]})
    );
}

// ---- Test 3: Server lifecycle ----

#[tokio::test]
async fn test_serve_stops_on_cancel() {
    let (state, adapter) = setup();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let token = CancellationToken::new();

    let server = tokio::spawn(serve_listener(
        listener,
        state.chat.clone(),
        1024,
        token.clone(),
    ));
    token.cancel();

    server.await.unwrap().unwrap();
    assert_eq!(adapter.initialize_count(), 1);
}
