// src/relay_client.rs - HTTP client for the chat relay endpoint.
//
// The relay hides the provider key; this client only ever talks to the
// configured relay URL. Two request shapes are supported, selected by the
// configured model family. Calls are single-shot: no retry, no timeout —
// the caller decides what to show the user when a call fails.
use crate::models::chat::ChatMessage;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

/// Model names carrying this marker use the web-search request shape.
pub const WEB_SEARCH_MARKER: &str = "gpt-5-search";

const LEGACY_MAX_TOKENS: u32 = 300;
const LEGACY_TEMPERATURE: f64 = 0.7;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("relay returned {status} {status_text}: {body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },
    #[error("relay request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("relay response had no message content")]
    MissingContent,
}

#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    relay_url: String,
    model: String,
}

impl RelayClient {
    pub fn new(relay_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            relay_url: relay_url.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn uses_web_search(&self) -> bool {
        self.model.contains(WEB_SEARCH_MARKER)
    }

    /// Request body for the configured model family. The web-search shape
    /// carries no sampling knobs; the legacy chat shape gets the fixed
    /// defaults.
    pub fn build_payload(&self, messages: &[ChatMessage]) -> Value {
        if self.uses_web_search() {
            json!({
                "model": self.model,
                "messages": messages,
                "store": false,
            })
        } else {
            json!({
                "model": self.model,
                "messages": messages,
                "max_tokens": LEGACY_MAX_TOKENS,
                "temperature": LEGACY_TEMPERATURE,
            })
        }
    }

    /// POST the message list to the relay and return the assistant reply,
    /// trimmed. Non-2xx responses fail with status, status text, and body.
    pub async fn send(&self, messages: &[ChatMessage]) -> Result<String, RelayError> {
        let payload = self.build_payload(messages);
        tracing::debug!(
            model = %self.model,
            message_count = messages.len(),
            "sending chat request to relay"
        );

        let response = self
            .client
            .post(&self.relay_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "relay call failed: {}", body);
            return Err(RelayError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
                body,
            });
        }

        let body: Value = response.json().await?;
        extract_reply(&body)
    }
}

/// Pull the first choice's message content out of the relay response.
pub fn extract_reply(body: &Value) -> Result<String, RelayError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.trim().to_string())
        .ok_or(RelayError::MissingContent)
}
