//! Subscription manager
//!
//! Owns the subscriber set and the monitoring flag. Both live behind one
//! mutex; each public operation is a single critical section, and the
//! confirmation message is sent only after the lock has been released.
//!
//! ## State
//!
//! ```text
//!            subscribe (first id)
//!   ┌──────┐ ───────────────────▶ ┌────────┐
//!   │ Idle │                      │ Active │
//!   └──────┘ ◀─────────────────── └────────┘
//!       unsubscribe (last id) / restoration
//! ```
//!
//! The monitor task is tracked separately from the flag. Going idle does
//! not cancel the task; it notices on its next cycle and retires itself.
//! A subscribe that lands before that reuses the still-running task, so at
//! most one monitor loop is ever probing.

use crate::messages;
use crate::monitor::MonitorLoop;
use crate::notifier::Notifier;
use crate::traits::RecipientId;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Whether a monitoring cycle is in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MonitoringState {
    /// Nobody is waiting for restoration
    #[default]
    Idle,
    /// At least one subscriber is waiting and the monitor loop runs
    Active,
}

#[derive(Default)]
struct SubscriberState {
    subscribers: HashSet<RecipientId>,
    monitoring: MonitoringState,
    /// Live monitor task, if any
    worker: Option<JoinHandle<()>>,
}

impl SubscriberState {
    fn worker_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

struct Shared {
    state: Mutex<SubscriberState>,
    notifier: Notifier,
    monitor: Arc<MonitorLoop>,
}

/// Shared handle to the subscriber set
///
/// Cloning is cheap; every clone talks to the same state.
#[derive(Clone)]
pub struct SubscriptionManager {
    inner: Arc<Shared>,
}

impl SubscriptionManager {
    /// Create an empty, idle manager
    pub fn new(notifier: Notifier, monitor: MonitorLoop) -> Self {
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(SubscriberState::default()),
                notifier,
                monitor: Arc::new(monitor),
            }),
        }
    }

    /// Add a subscriber
    ///
    /// No-op (and no confirmation) if `id` is already subscribed. The first
    /// subscriber activates monitoring and starts the monitor task unless a
    /// previous one is still winding down.
    ///
    /// # Returns
    ///
    /// `true` if `id` was added
    pub async fn subscribe(&self, id: RecipientId) -> bool {
        {
            let mut state = self.inner.state.lock().await;

            if !state.subscribers.insert(id.clone()) {
                debug!("{} is already subscribed", id);
                return false;
            }

            if state.monitoring == MonitoringState::Idle {
                state.monitoring = MonitoringState::Active;
                info!("Monitoring activated");
            }

            if !state.worker_alive() {
                let monitor = Arc::clone(&self.inner.monitor);
                state.worker = Some(tokio::spawn(monitor.run(self.clone())));
                debug!("Monitor task spawned");
            }

            info!("{} subscribed ({} total)", id, state.subscribers.len());
        }

        self.inner
            .notifier
            .notify(&id, messages::SUBSCRIBED, Some(&messages::stop_keyboard()))
            .await;
        true
    }

    /// Remove a subscriber
    ///
    /// No-op if `id` is not subscribed. Removing the last subscriber puts
    /// monitoring back to idle.
    ///
    /// # Returns
    ///
    /// `true` if `id` was removed
    pub async fn unsubscribe(&self, id: &RecipientId) -> bool {
        {
            let mut state = self.inner.state.lock().await;

            if !state.subscribers.remove(id) {
                debug!("{} is not subscribed", id);
                return false;
            }

            info!("{} unsubscribed ({} left)", id, state.subscribers.len());

            if state.subscribers.is_empty() {
                state.monitoring = MonitoringState::Idle;
                info!("No subscribers left, monitoring idle");
            }
        }

        self.inner
            .notifier
            .notify(id, messages::UNSUBSCRIBED, Some(&messages::start_keyboard()))
            .await;
        true
    }

    /// Current subscribers, sorted
    pub async fn subscribers(&self) -> Vec<RecipientId> {
        let state = self.inner.state.lock().await;
        let mut ids: Vec<_> = state.subscribers.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Whether `id` is currently subscribed
    pub async fn is_subscribed(&self, id: &RecipientId) -> bool {
        self.inner.state.lock().await.subscribers.contains(id)
    }

    /// Current monitoring state
    pub async fn monitoring_state(&self) -> MonitoringState {
        self.inner.state.lock().await.monitoring
    }

    /// Whether a monitor task is alive (it may be winding down)
    pub async fn is_monitor_running(&self) -> bool {
        self.inner.state.lock().await.worker_alive()
    }

    /// Abort the monitor task, if any
    ///
    /// Used on process shutdown. Subscribers are kept.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(handle) = state.worker.take() {
            handle.abort();
            info!("Monitor task aborted");
        }
        state.monitoring = MonitoringState::Idle;
    }

    /// Called by the monitor task at the top of every cycle
    ///
    /// Returns `false` (and forgets the task) when there is nothing left
    /// to monitor; the task must exit.
    pub(crate) async fn continue_monitoring(&self) -> bool {
        let mut state = self.inner.state.lock().await;

        if state.monitoring == MonitoringState::Active && !state.subscribers.is_empty() {
            return true;
        }

        state.monitoring = MonitoringState::Idle;
        state.worker = None;
        false
    }

    /// Atomically take every current subscriber, go idle and retire the
    /// calling monitor task
    ///
    /// Only the monitor task calls this, on detection. Ids that subscribe
    /// after it returns are not part of the snapshot; the first of them
    /// starts a fresh task.
    pub(crate) async fn snapshot_and_clear(&self) -> Vec<RecipientId> {
        let mut state = self.inner.state.lock().await;
        state.worker = None;
        Self::drain(&mut state)
    }

    fn drain(state: &mut SubscriberState) -> Vec<RecipientId> {
        let mut ids: Vec<_> = state.subscribers.drain().collect();
        ids.sort();
        state.monitoring = MonitoringState::Idle;
        ids
    }
}
