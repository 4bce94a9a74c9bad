// src/handlers/chat.rs - Chat and routine-generation endpoints.
//
// The state lock is held while preparing and recording an exchange but
// released across the relay round trip, so the network wait never blocks
// reads of the catalog or selection.
use crate::models::chat::Role;
use crate::render::render;
use crate::relay_client::RelayError;
use crate::AppState;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

pub fn chat_routes() -> Router {
    Router::new()
        .route("/api/chat", post(send_message))
        .route("/api/routine", post(generate_routine))
        .route("/api/chat/history", get(get_history))
}

async fn send_message(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "message must not be empty" })),
        );
    }

    let exchange = {
        let mut controller = state.controller.write().await;
        controller.prepare_message(&message)
    };

    let reply = match state.relay.send(&exchange.messages).await {
        Ok(reply) => reply,
        Err(err) => return relay_failure(err),
    };

    let applied = {
        let mut controller = state.controller.write().await;
        controller.complete_exchange(&exchange, &reply)
    };
    if !applied {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "superseded by a newer request" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "reply": reply,
            "reply_html": render(&reply),
            "message_html": render(&exchange.user_text),
        })),
    )
}

async fn generate_routine(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let exchange = {
        let mut controller = state.controller.write().await;
        controller.prepare_routine()
    };

    let Some(exchange) = exchange else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "select at least one product first" })),
        );
    };

    let routine = match state.relay.send(&exchange.messages).await {
        Ok(routine) => routine,
        Err(err) => return relay_failure(err),
    };

    let applied = {
        let mut controller = state.controller.write().await;
        controller.complete_exchange(&exchange, &routine)
    };
    if !applied {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "superseded by a newer request" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "routine": routine,
            "routine_html": render(&routine),
        })),
    )
}

/// Transcript for re-rendering the chat window. The seeded instruction
/// message is filtered out; the page only shows user/assistant turns.
async fn get_history(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let controller = state.controller.read().await;
    let messages: Vec<Value> = controller
        .history()
        .iter()
        .filter(|message| message.role != Role::System)
        .map(|message| {
            json!({
                "role": message.role,
                "content": message.content,
                "content_html": render(&message.content),
            })
        })
        .collect();

    Json(json!({ "messages": messages }))
}

/// Map a failed relay call to one 502 with enough detail for the log; the
/// page shows its generic apology and the user may simply retry.
fn relay_failure(err: RelayError) -> (StatusCode, Json<Value>) {
    tracing::error!("relay exchange failed: {}", err);
    let detail = match &err {
        RelayError::Http { status, status_text, .. } => {
            format!("relay returned {} {}", status, status_text)
        }
        RelayError::Transport(_) => "could not reach the relay".to_string(),
        RelayError::MissingContent => "relay response had no message content".to_string(),
    };
    (StatusCode::BAD_GATEWAY, Json(json!({ "error": detail })))
}
