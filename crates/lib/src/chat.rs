//! Google Chat client: create messages in a space via the Chat REST API.

use serde::Serialize;
use thiserror::Error;

const CHAT_API_BASE: &str = "https://chat.googleapis.com/v1";

/// Error from a relay attempt. The caller decides whether a failure is fatal;
/// the HTTP front door logs it and reports `relayed: false`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("chat token not configured (set GOOGLE_CHAT_TOKEN or chat.token)")]
    TokenMissing,
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("create message failed: {status} {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Wire payload for a Chat message: `{ "text": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextMessage {
    pub text: String,
}

impl TextMessage {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Build a payload from any JSON value: strings are used as-is, anything
    /// else is serialized to its JSON text first.
    pub fn new(value: &serde_json::Value) -> Self {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self { text }
    }
}

/// Chat API client: posts messages to `spaces/<space>/messages` with a
/// bearer token. The base URL is overridable for tests or custom endpoints.
pub struct GoogleChatClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl GoogleChatClient {
    pub fn new(base_url: Option<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| CHAT_API_BASE.to_string()),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn message_url(&self, space: &str) -> String {
        format!("{}/spaces/{}/messages", self.base_url.trim_end_matches('/'), space)
    }

    /// Create a message in `space`. Non-2xx responses are errors carrying the
    /// status and body text.
    pub async fn create_message(
        &self,
        space: &str,
        message: &TextMessage,
    ) -> Result<(), RelayError> {
        let token = self.token.as_ref().ok_or(RelayError::TokenMissing)?;
        let res = self
            .client
            .post(self.message_url(space))
            .bearer_auth(token)
            .json(message)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(RelayError::Status { status, body });
        }
        Ok(())
    }
}
