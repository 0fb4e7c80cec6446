//! Test doubles and common utilities for wifiwatch contract tests
//!
//! The doubles record everything they are asked to do so the tests can
//! assert on observable behavior: messages sent, scans performed, offsets
//! requested.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use wifiwatch_core::error::{Error, Result};
use wifiwatch_core::traits::{
    InboundMessage, InboundUpdate, MessageTransport, NetworkScanner, RecipientId, ReplyKeyboard,
};
use wifiwatch_core::{MonitorLoop, Notifier, PresenceProber, SubscriptionManager};

pub const TARGET: &str = "HomeNet";
pub const INTERVAL: Duration = Duration::from_secs(60);

/// A scanner whose answer the test controls
///
/// Clones share state, so the test keeps one clone and hands the other to
/// the code under test.
#[derive(Clone, Default)]
pub struct ScriptedScanner {
    visible: Arc<Mutex<Option<HashSet<String>>>>,
    scan_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedScanner {
    /// Scanner that sees no networks
    pub fn new() -> Self {
        let scanner = Self::default();
        scanner.show(&[]);
        scanner
    }

    /// Subsequent scans return these names
    pub fn show(&self, names: &[&str]) {
        *self.visible.lock().unwrap() = Some(names.iter().map(|n| n.to_string()).collect());
    }

    /// Subsequent scans fail
    pub fn fail(&self) {
        *self.visible.lock().unwrap() = None;
    }

    /// Number of scans performed so far
    pub fn scan_count(&self) -> usize {
        self.scan_count.load(Ordering::SeqCst)
    }

    /// Highest number of scans that were ever running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkScanner for ScriptedScanner {
    async fn scan(&self) -> Result<HashSet<String>> {
        self.scan_count.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Give an overlapping loop the chance to show up
        tokio::time::sleep(Duration::from_millis(5)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.visible
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::scan("iwlist exited with status 255"))
    }

    fn scanner_name(&self) -> &'static str {
        "scripted"
    }
}

/// A message captured by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: String,
    pub text: String,
    pub buttons: Option<Vec<String>>,
}

/// One scripted answer to `get_updates`
pub enum ScriptedPoll {
    Updates(Vec<InboundUpdate>),
    Fail,
    Malformed,
}

/// A transport that records sends and replays scripted polls
///
/// When the script runs dry, `get_updates` behaves like an idle long-poll:
/// it waits out the timeout and returns nothing.
///
/// Sends of a text registered with [`RecordingTransport::hold`] are
/// recorded, then parked until [`RecordingTransport::release`].
#[derive(Clone)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    polls: Arc<Mutex<VecDeque<ScriptedPoll>>>,
    offsets: Arc<Mutex<Vec<i64>>>,
    held_text: Arc<Mutex<Option<String>>>,
    gate: Arc<Semaphore>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            sent: Arc::default(),
            polls: Arc::default(),
            offsets: Arc::default(),
            held_text: Arc::default(),
            gate: Arc::new(Semaphore::new(0)),
        }
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for the next `get_updates`
    pub fn script(&self, poll: ScriptedPoll) {
        self.polls.lock().unwrap().push_back(poll);
    }

    /// Park every send of `text` until [`RecordingTransport::release`]
    pub fn hold(&self, text: &str) {
        *self.held_text.lock().unwrap() = Some(text.to_string());
    }

    /// Let parked and future sends through
    pub fn release(&self) {
        *self.held_text.lock().unwrap() = None;
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    /// All messages sent so far
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages sent to one chat
    pub fn sent_to(&self, chat_id: &str) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }

    /// Offsets passed to `get_updates`, in call order
    pub fn offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat_id: &RecipientId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<u16> {
        self.sent.lock().unwrap().push(SentMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            buttons: keyboard.map(|k| k.buttons.clone()),
        });

        let held = self.held_text.lock().unwrap().as_deref() == Some(text);
        if held {
            let _permit = self.gate.acquire().await;
        }
        Ok(200)
    }

    async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<InboundUpdate>> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.polls.lock().unwrap().pop_front();
        match next {
            Some(ScriptedPoll::Updates(updates)) => Ok(updates),
            Some(ScriptedPoll::Fail) => Err(Error::transport("connection reset by peer")),
            Some(ScriptedPoll::Malformed) => Err(Error::malformed("missing field `result`")),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(Vec::new())
            }
        }
    }

    fn transport_name(&self) -> &'static str {
        "recording"
    }
}

/// Build an inbound text update
pub fn text_update(update_id: i64, chat_id: &str, text: &str) -> InboundUpdate {
    InboundUpdate {
        update_id,
        message: Some(InboundMessage {
            chat_id: RecipientId::from(chat_id),
            text: Some(text.to_string()),
        }),
    }
}

/// Build a subscription manager over the doubles
pub fn manager_with(scanner: &ScriptedScanner, transport: &RecordingTransport) -> SubscriptionManager {
    manager_with_interval(scanner, transport, INTERVAL)
}

/// Build a subscription manager with a custom monitor cadence
pub fn manager_with_interval(
    scanner: &ScriptedScanner,
    transport: &RecordingTransport,
    interval: Duration,
) -> SubscriptionManager {
    let notifier = Notifier::new(Arc::new(transport.clone()));
    let prober = PresenceProber::new(Box::new(scanner.clone()), Duration::from_secs(30));
    let monitor = MonitorLoop::new(prober, notifier.clone(), TARGET, interval);
    SubscriptionManager::new(notifier, monitor)
}

/// Minimal valid configuration for daemon-level tests
pub fn minimal_config(chat_ids: &[&str]) -> wifiwatch_core::MonitorConfig {
    wifiwatch_core::MonitorConfig::new(TARGET, "123456:test-token")
        .with_chat_ids(chat_ids.iter().copied())
}

/// Let spawned tasks run without advancing past any real deadline
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

pub fn id(raw: &str) -> RecipientId {
    RecipientId::from(raw)
}
