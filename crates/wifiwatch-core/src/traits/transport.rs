// # Message Transport Trait
//
// Defines the interface for talking to recipients through a messaging bot.
//
// ## Implementations
//
// - Telegram Bot API: `wifiwatch-telegram` crate
//
// The transport is a thin request/response layer. Cursor bookkeeping,
// allow-list checks and delivery classification live in the core.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque identifier of a notification target (a chat id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(String);

impl RecipientId {
    /// Create a recipient id from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RecipientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for RecipientId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// A single-row reply keyboard offered alongside a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyKeyboard {
    /// Button labels, left to right
    pub buttons: Vec<String>,
}

impl ReplyKeyboard {
    /// Keyboard with exactly one button
    pub fn single(label: impl Into<String>) -> Self {
        Self {
            buttons: vec![label.into()],
        }
    }
}

/// One inbound update as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUpdate {
    /// Monotonic sequence number assigned by the transport
    pub update_id: i64,
    /// The message, if this update carries one
    pub message: Option<InboundMessage>,
}

/// Text message carried by an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat the message came from
    pub chat_id: RecipientId,
    /// Message text (absent for stickers, photos, ...)
    pub text: Option<String>,
}

/// Trait for messaging transport implementations
///
/// Implementations must be thread-safe: the command poller and the
/// monitor loop call into the same transport concurrently.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Send one text message
    ///
    /// # Returns
    ///
    /// - `Ok(u16)`: The transport answered; this is its HTTP status,
    ///   which may still indicate failure
    /// - `Err(Error)`: No answer was obtained (connection, timeout)
    async fn send_message(
        &self,
        chat_id: &RecipientId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<u16, crate::Error>;

    /// Long-poll for updates with `update_id >= offset`
    ///
    /// Blocks for at most `timeout` on the server side. Implementations
    /// bound the whole request slightly above that.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<InboundUpdate>)`: Updates in the order received
    /// - `Err(Error::Transport)`: Request failed or non-200 status
    /// - `Err(Error::MalformedResponse)`: Body did not match the schema
    async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<InboundUpdate>, crate::Error>;

    /// Short name used in log lines
    fn transport_name(&self) -> &'static str;
}
