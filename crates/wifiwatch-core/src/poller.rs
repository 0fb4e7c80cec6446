//! Command poller
//!
//! Long-polls the transport for inbound messages and turns recognized
//! commands into subscription changes.
//!
//! ## Per-update flow
//!
//! 1. Advance the cursor past the update, whatever it contains
//! 2. Reject chats outside the allow-list (with a start button)
//! 3. Dispatch the start/stop command; ignore any other text
//!
//! Advancing first means an update that cannot be handled is never
//! redelivered.

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::messages;
use crate::notifier::Notifier;
use crate::subscription::SubscriptionManager;
use crate::traits::{InboundUpdate, MessageTransport, RecipientId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Recognized operator commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Subscribe the sender
    Start,
    /// Unsubscribe the sender
    Stop,
}

impl Command {
    /// Match a message text exactly against the known commands
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            messages::START_COMMAND => Some(Self::Start),
            messages::STOP_COMMAND => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Sequence number of the last consumed update
///
/// Never moves backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCursor(i64);

impl UpdateCursor {
    /// Cursor that has consumed nothing
    pub fn new() -> Self {
        Self(0)
    }

    /// Last consumed update id
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Offset to request next
    pub fn next_offset(&self) -> i64 {
        self.0 + 1
    }

    /// Record that `update_id` has been consumed
    pub fn advance(&mut self, update_id: i64) {
        self.0 = self.0.max(update_id);
    }
}

/// Long-polling command loop
pub struct CommandPoller {
    transport: Arc<dyn MessageTransport>,
    notifier: Notifier,
    manager: SubscriptionManager,
    allow_list: HashSet<RecipientId>,
    poll_timeout: Duration,
    backoff: Duration,
    cursor: UpdateCursor,
}

impl CommandPoller {
    /// Create a poller
    pub fn new(
        transport: Arc<dyn MessageTransport>,
        manager: SubscriptionManager,
        allow_list: impl IntoIterator<Item = RecipientId>,
        poll_timeout: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            notifier: Notifier::new(Arc::clone(&transport)),
            transport,
            manager,
            allow_list: allow_list.into_iter().collect(),
            poll_timeout,
            backoff,
            cursor: UpdateCursor::new(),
        }
    }

    /// Create a poller from configuration
    pub fn from_config(
        transport: Arc<dyn MessageTransport>,
        manager: SubscriptionManager,
        config: &MonitorConfig,
    ) -> Self {
        Self::new(
            transport,
            manager,
            config.chat_ids.iter().map(|id| RecipientId::new(id.as_str())),
            config.poll_timeout(),
            config.poll_backoff(),
        )
    }

    /// Current cursor
    pub fn cursor(&self) -> UpdateCursor {
        self.cursor
    }

    /// Poll forever
    ///
    /// Transport errors are logged and retried after the backoff; this
    /// future never completes on its own.
    pub async fn run(&mut self) {
        info!("Command poller started (allow-list: {} chat(s))", self.allow_list.len());

        loop {
            match self.poll_once().await {
                Ok(0) => {}
                Ok(n) => debug!("Processed {} update(s), cursor at {}", n, self.cursor.value()),
                Err(e) => {
                    if e.is_transient() {
                        warn!("Polling {} failed: {}", self.transport.transport_name(), e);
                    } else {
                        error!("Polling {} failed: {}", self.transport.transport_name(), e);
                    }
                    tokio::time::sleep(self.backoff).await;
                }
            }
        }
    }

    /// One long-poll round trip
    ///
    /// # Returns
    ///
    /// - `Ok(usize)`: Number of updates consumed
    /// - `Err(Error)`: Fetch failed; the cursor did not move
    pub async fn poll_once(&mut self) -> Result<usize> {
        let updates = self
            .transport
            .get_updates(self.cursor.next_offset(), self.poll_timeout)
            .await?;

        let count = updates.len();
        for update in updates {
            self.handle_update(update).await;
        }
        Ok(count)
    }

    async fn handle_update(&mut self, update: InboundUpdate) {
        self.cursor.advance(update.update_id);

        let Some(message) = update.message else {
            debug!("Update {} carries no message, skipping", update.update_id);
            return;
        };
        let chat_id = message.chat_id;

        if !self.allow_list.contains(&chat_id) {
            info!("Rejecting chat {}: not in allow-list", chat_id);
            self.notifier
                .notify(&chat_id, messages::ACCESS_DENIED, Some(&messages::start_keyboard()))
                .await;
            return;
        }

        let Some(text) = message.text else {
            return;
        };

        match Command::parse(&text) {
            Some(Command::Start) => {
                self.manager.subscribe(chat_id).await;
            }
            Some(Command::Stop) => {
                self.manager.unsubscribe(&chat_id).await;
            }
            None => {}
        }
    }
}
