// # Telegram Transport
//
// This crate provides a `MessageTransport` over the Telegram Bot API.
//
// ## Scope
//
// - ✅ One HTTP request per call (`sendMessage` or `getUpdates`)
// - ✅ Explicit response schema; a broken envelope is a malformed response,
//   a single unreadable message is skipped
// - ✅ Long-poll requests bounded by the poll timeout plus a margin
// - ❌ NO retry logic (owned by the command poller)
// - ❌ NO cursor bookkeeping (owned by the command poller)
// - ❌ NO allow-list checks (owned by the command poller)
//
// ## Security Requirements
//
// - The bot token is part of every URL; it NEVER appears in logs or
//   error messages (URLs are stripped from reqwest errors)
//
// ## API Reference
//
// - Send: POST `/bot<token>/sendMessage` `{chat_id, text, reply_markup?}`
// - Receive: GET `/bot<token>/getUpdates?offset=<n>&timeout=<secs>`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wifiwatch_core::config::DEFAULT_TELEGRAM_API_URL;
use wifiwatch_core::traits::{InboundMessage, InboundUpdate, MessageTransport, RecipientId, ReplyKeyboard};
use wifiwatch_core::{Error, Result};

/// Default HTTP timeout for `sendMessage` (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time granted to a long-poll request beyond the server-side timeout
const LONG_POLL_MARGIN: Duration = Duration::from_secs(10);

/// Telegram Bot API transport
pub struct TelegramTransport {
    /// Bot token
    /// ⚠️ NEVER log this value
    token: String,

    /// API base URL, without trailing slash
    api_base: String,

    /// HTTP client
    client: reqwest::Client,
}

// Custom Debug implementation that hides the bot token
impl std::fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramTransport")
            .field("token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelegramTransport {
    /// Create a transport against the public Bot API
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_api_base(token, DEFAULT_TELEGRAM_API_URL)
    }

    /// Create a transport against a custom API base (local Bot API server)
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::config("Telegram bot token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    /// Send a message
    ///
    /// ```http
    /// POST /bot<token>/sendMessage
    /// {"chat_id": "...", "text": "...", "reply_markup": {...}}
    /// ```
    async fn send_message(
        &self,
        chat_id: &RecipientId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<u16> {
        let body = SendMessageRequest {
            chat_id: chat_id.as_str(),
            text,
            reply_markup: keyboard.map(ReplyMarkup::from),
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::transport(format!("sendMessage failed: {}", e.without_url())))?;

        Ok(response.status().as_u16())
    }

    /// Long-poll for updates
    ///
    /// ```http
    /// GET /bot<token>/getUpdates?offset=<n>&timeout=<secs>
    /// ```
    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<InboundUpdate>> {
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("offset", offset), ("timeout", timeout.as_secs() as i64)])
            .timeout(timeout + LONG_POLL_MARGIN)
            .send()
            .await
            .map_err(|e| Error::transport(format!("getUpdates failed: {}", e.without_url())))?;

        let status = response.status();
        if status.as_u16() != 200 {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(match status.as_u16() {
                401 | 404 => Error::transport(format!(
                    "Bot token rejected. Status: {}", status
                )),
                409 => Error::transport(format!(
                    "Another getUpdates consumer or a webhook is active. Status: {}", status
                )),
                429 => Error::transport(format!(
                    "Rate limit exceeded. Status: {} - {}", status, error_text
                )),
                _ => Error::transport(format!(
                    "getUpdates failed: {} - {}", status, error_text
                )),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response: {}", e.without_url())))?;

        let updates = parse_updates(&body)?;
        tracing::debug!("getUpdates(offset={}) returned {} update(s)", offset, updates.len());
        Ok(updates)
    }

    fn transport_name(&self) -> &'static str {
        "telegram"
    }
}

/// Parse a `getUpdates` response body
///
/// Missing `ok`, `result` or any `update_id` makes the whole response
/// malformed. A `message` that does not fit the schema is dropped with a
/// warning and the update kept, so the cursor still moves past it. Updates
/// without a message (edits, callbacks, ...) are kept for the same reason.
pub fn parse_updates(body: &str) -> Result<Vec<InboundUpdate>> {
    let response: ApiResponse<Vec<RawUpdate>> = serde_json::from_str(body)
        .map_err(|e| Error::malformed(format!("getUpdates: {}", e)))?;

    if !response.ok {
        return Err(Error::malformed(format!(
            "getUpdates returned ok=false: {}",
            response.description.unwrap_or_default()
        )));
    }

    let updates = response
        .result
        .ok_or_else(|| Error::malformed("getUpdates: missing field `result`"))?;

    Ok(updates.into_iter().map(InboundUpdate::from).collect())
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    update_id: i64,
    /// Kept loose; decoded per update so one odd message cannot sink the batch
    message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    text: Option<String>,
    chat: RawChat,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

impl From<RawUpdate> for InboundUpdate {
    fn from(raw: RawUpdate) -> Self {
        let message = raw.message.and_then(|value| {
            match serde_json::from_value::<RawMessage>(value) {
                Ok(m) => Some(InboundMessage {
                    chat_id: RecipientId::from(m.chat.id),
                    text: m.text,
                }),
                Err(e) => {
                    tracing::warn!("Skipping unreadable message in update {}: {}", raw.update_id, e);
                    None
                }
            }
        });

        InboundUpdate {
            update_id: raw.update_id,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize)]
struct ReplyMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
}

#[derive(Debug, Serialize)]
struct KeyboardButton {
    text: String,
}

impl From<&ReplyKeyboard> for ReplyMarkup {
    fn from(keyboard: &ReplyKeyboard) -> Self {
        let row = keyboard
            .buttons
            .iter()
            .map(|label| KeyboardButton { text: label.clone() })
            .collect();

        ReplyMarkup {
            keyboard: vec![row],
            resize_keyboard: true,
        }
    }
}
