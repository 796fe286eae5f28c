//! JSON-RPC 2.0 gateway for agent dispatch.
//!
//! One route, `POST /a2a/agent/{agent_id}`. Each request is validated,
//! normalized, dispatched to a registered [`Agent`], and answered with
//! exactly one well-formed JSON-RPC response; no failure escapes the
//! handler.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::agent::{AgentRegistry, ContentBlock, Message};

// JSON-RPC error codes. -32602 doubles as the unknown-agent code.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const AGENT_NOT_FOUND: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Shared state threaded through the axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AgentRegistry>,
}

/// Build the axum [`Router`] for the gateway.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/a2a/agent/{agent_id}", post(a2a_agent_handler))
        .with_state(state)
}

// ─── Message normalization ───────────────────────────────────────────────────

/// Normalizes the polymorphic inbound `message` value into a uniform
/// [`Message`]. Total: every input shape maps to something, never an error.
///
/// An object with a `parts` array keeps its non-empty text parts in
/// order; a JSON string becomes a single block; anything else is wrapped
/// as its compact JSON rendering. Role defaults to `"user"`.
pub fn normalize_message(raw: &Value) -> Message {
    let role = raw
        .get("role")
        .and_then(Value::as_str)
        .unwrap_or("user")
        .to_string();

    let blocks = match raw.get("parts").and_then(Value::as_array) {
        Some(parts) => parts.iter().filter_map(text_block).collect(),
        None => match raw {
            Value::String(s) => vec![ContentBlock::text(s.clone())],
            other => vec![ContentBlock::text(other.to_string())],
        },
    };

    Message { role, blocks }
}

/// Maps one structured part to a block, dropping non-text and empty parts.
fn text_block(part: &Value) -> Option<ContentBlock> {
    if part.get("kind").and_then(Value::as_str) != Some("text") {
        return None;
    }
    let text = part.get("text").and_then(Value::as_str)?;
    if text.is_empty() {
        return None;
    }
    Some(ContentBlock::text(text))
}

// ─── Route handler ───────────────────────────────────────────────────────────

async fn a2a_agent_handler(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    body: Bytes,
) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return rpc_error(
                StatusCode::BAD_REQUEST,
                Value::Null,
                PARSE_ERROR,
                "Parse error",
                Some(json!(e.to_string())),
            );
        }
    };

    // A JSON null id counts as absent; JSON-RPC reserves it for
    // responses whose request id could not be determined.
    let request_id = body.get("id").cloned().unwrap_or(Value::Null);
    let version_ok = body.get("jsonrpc").and_then(Value::as_str) == Some("2.0");
    if !version_ok || request_id.is_null() {
        tracing::warn!("Rejecting invalid JSON-RPC envelope");
        return rpc_error(
            StatusCode::BAD_REQUEST,
            request_id,
            INVALID_REQUEST,
            "Invalid JSON-RPC 2.0 request",
            None,
        );
    }

    let Some(agent) = state.registry.get(&agent_id) else {
        return rpc_error(
            StatusCode::NOT_FOUND,
            request_id,
            AGENT_NOT_FOUND,
            format!("Agent '{}' not found", agent_id),
            None,
        );
    };

    let raw_message = body
        .pointer("/params/message")
        .cloned()
        .unwrap_or(Value::Null);
    let message = normalize_message(&raw_message);

    match agent.generate(&[message]).await {
        Ok(text) => rpc_success(request_id, &text),
        // The request id is dropped on purpose: failures never echo an
        // untrusted id back to the caller.
        Err(e) => {
            tracing::error!("Agent '{}' failed: {}", agent_id, e);
            rpc_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                Value::Null,
                INTERNAL_ERROR,
                "Internal Error",
                Some(json!(e.to_string())),
            )
        }
    }
}

fn rpc_success(id: Value, text: &str) -> Response {
    let body = json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "message": text,
            "artifacts": [{ "kind": "text", "text": text }],
            "status": { "state": "completed", "timestamp": Utc::now().to_rfc3339() },
        },
    });
    (StatusCode::OK, Json(body)).into_response()
}

fn rpc_error(
    status: StatusCode,
    id: Value,
    code: i64,
    message: impl Into<String>,
    data: Option<Value>,
) -> Response {
    let mut error = json!({ "code": code, "message": message.into() });
    if let Some(data) = data {
        error["data"] = data;
    }
    let body = json!({ "jsonrpc": "2.0", "id": id, "error": error });
    (status, Json(body)).into_response()
}

// ─── Gateway tests ───────────────────────────────────────────────────────────
