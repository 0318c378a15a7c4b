// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Handles `POST /webhooks/{adapter}` and `GET /health`.

use std::sync::Arc;

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use parley_core::{ChatError, WaitUntil, WebhookOptions};

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Registered adapter names, sorted.
    pub adapters: Vec<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    /// Stable error code, e.g. `ADAPTER_NOT_FOUND`.
    pub code: String,
}

impl ErrorResponse {
    fn from_chat_error(err: &ChatError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}

/// POST /webhooks/{adapter}
///
/// Rebuilds the raw request and hands it to the adapter. Processing started by
/// the adapter is tracked on the gateway so shutdown can wait for it.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    Path(adapter): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut request = http::Request::new(body);
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;

    let tasks = state.tasks.clone();
    let wait_until: WaitUntil = Arc::new(move |task| {
        tasks.spawn(task);
    });

    let options = WebhookOptions::with_wait_until(wait_until);

    match state.chat.handle_webhook(&adapter, request, options).await {
        Ok(response) => response.map(Body::from).into_response(),
        Err(err) => {
            let status = match err {
                ChatError::AdapterNotFound { .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::warn!(adapter = %adapter, code = err.code(), "webhook rejected: {err}");
            (status, Json(ErrorResponse::from_chat_error(&err))).into_response()
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        adapters: state.chat.adapter_names(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            adapters: vec!["slack".to_string()],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"status":"ok","adapters":["slack"]}"#);
    }

    #[test]
    fn error_response_carries_code() {
        let err = ChatError::AdapterNotFound {
            name: "teams".to_string(),
        };
        let json = serde_json::to_value(ErrorResponse::from_chat_error(&err)).unwrap();
        assert_eq!(json["code"], "ADAPTER_NOT_FOUND");
        assert!(json["error"].as_str().unwrap().contains("teams"));
    }
}
