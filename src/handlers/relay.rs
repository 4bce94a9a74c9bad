// src/handlers/relay.rs - The edge relay: forwards chat payloads to the
// upstream provider with the secret key from the environment. Mounted only
// when OPENAI_API_KEY is configured; the browser-facing client never holds
// the key or talks to the provider directly.
use crate::AppState;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

const RAW_BODY_ECHO_LIMIT: usize = 1000;

#[derive(Debug, PartialEq, Eq)]
enum UpstreamApi {
    ChatCompletions,
    Responses,
}

impl UpstreamApi {
    fn url(&self) -> &'static str {
        match self {
            UpstreamApi::ChatCompletions => CHAT_COMPLETIONS_URL,
            UpstreamApi::Responses => RESPONSES_URL,
        }
    }
}

pub fn relay_routes() -> Router {
    Router::new().route("/relay", post(relay))
}

async fn relay(Extension(state): Extension<Arc<AppState>>, body: String) -> impl IntoResponse {
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Empty body received" })),
        );
    }

    let parsed: Value = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(_) => {
            // Echo the (truncated) raw body back so a broken client can see
            // what it actually sent.
            let raw = if body.len() > RAW_BODY_ECHO_LIMIT {
                format!("{}... (truncated)", truncate_at_boundary(&body, RAW_BODY_ECHO_LIMIT))
            } else {
                body.clone()
            };
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON body", "raw": raw })),
            );
        }
    };

    let Some(api_key) = state.config.openai_api_key.as_deref() else {
        // Route is only mounted with a key, but belt and braces.
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "relay is not configured" })),
        );
    };

    let (upstream, forward_body) = build_forward_body(&parsed, &body);
    tracing::debug!(upstream = ?upstream, "forwarding relay request");

    let response = match state
        .upstream
        .post(upstream.url())
        .bearer_auth(api_key)
        .json(&forward_body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            tracing::error!("upstream request failed: {}", err);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "upstream request failed" })),
            );
        }
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    match response.json::<Value>().await {
        Ok(data) => (status, Json(data)),
        Err(err) => {
            tracing::error!("failed to read upstream response: {}", err);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "invalid upstream response" })),
            )
        }
    }
}

/// Pick the upstream API by the model marker and translate the client body.
/// Model names containing "gpt-5-search" route to the Responses API; the
/// chat-style payload is conservatively flattened into one `input` string so
/// the model still sees the conversation. Everything else keeps the legacy
/// chat/completions forwarding.
fn build_forward_body(client_body: &Value, raw_body: &str) -> (UpstreamApi, Value) {
    let model = client_body["model"].as_str().unwrap_or_default();

    if model.contains(crate::relay_client::WEB_SEARCH_MARKER) {
        let input = if let Some(input) = client_body["input"].as_str() {
            input.to_string()
        } else if let Some(messages) = client_body["messages"].as_array() {
            messages
                .iter()
                .map(|message| {
                    format!(
                        "{}: {}",
                        message["role"].as_str().unwrap_or_default(),
                        message["content"].as_str().unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        } else if let Some(prompt) = client_body["prompt"].as_str() {
            prompt.to_string()
        } else {
            raw_body.to_string()
        };

        let forward = json!({
            "model": model,
            "input": input,
            "temperature": client_body.get("temperature").cloned().unwrap_or(json!(0.7)),
            "max_output_tokens": client_body.get("max_tokens").cloned().unwrap_or(json!(300)),
        });
        (UpstreamApi::Responses, forward)
    } else {
        let forward = json!({
            "model": if model.is_empty() { "gpt-4o" } else { model },
            "messages": client_body.get("messages").cloned().unwrap_or(Value::Null),
            "max_tokens": client_body.get("max_tokens").cloned().unwrap_or(json!(300)),
            "temperature": client_body.get("temperature").cloned().unwrap_or(json!(0.7)),
        });
        (UpstreamApi::ChatCompletions, forward)
    }
}

fn truncate_at_boundary(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_search_models_route_to_responses_without_legacy_fields() {
        let client_body = json!({
            "model": "gpt-5-search-preview",
            "messages": [
                {"role": "system", "content": "be helpful"},
                {"role": "user", "content": "what is new in suncare?"}
            ],
            "store": false,
        });

        let (upstream, forward) = build_forward_body(&client_body, "{}");
        assert_eq!(upstream, UpstreamApi::Responses);
        assert!(forward.get("messages").is_none());
        assert!(forward.get("max_tokens").is_none());
        assert_eq!(forward["max_output_tokens"], 300);
        assert_eq!(forward["temperature"], 0.7);
        assert_eq!(
            forward["input"],
            "system: be helpful\n\nuser: what is new in suncare?"
        );
    }

    #[test]
    fn legacy_models_keep_chat_completions_with_defaults() {
        let client_body = json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "hi"}],
        });

        let (upstream, forward) = build_forward_body(&client_body, "{}");
        assert_eq!(upstream, UpstreamApi::ChatCompletions);
        assert_eq!(forward["max_tokens"], 300);
        assert_eq!(forward["temperature"], 0.7);
        assert_eq!(forward["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn caller_overrides_survive_forwarding() {
        let client_body = json!({
            "model": "gpt-4o",
            "messages": [],
            "max_tokens": 512,
            "temperature": 0.2,
        });

        let (_, forward) = build_forward_body(&client_body, "{}");
        assert_eq!(forward["max_tokens"], 512);
        assert_eq!(forward["temperature"], 0.2);
    }

    #[test]
    fn missing_model_falls_back_to_default() {
        let client_body = json!({ "messages": [] });
        let (upstream, forward) = build_forward_body(&client_body, "{}");
        assert_eq!(upstream, UpstreamApi::ChatCompletions);
        assert_eq!(forward["model"], "gpt-4o");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "héllo".repeat(300);
        let cut = truncate_at_boundary(&text, 1000);
        assert!(cut.len() <= 1000);
        assert!(text.starts_with(cut));
    }
}
