//! Monitor loop
//!
//! The recurring task that waits for the target network to come back.
//!
//! ## Cycle
//!
//! 1. Exit if monitoring went idle
//! 2. Probe for visible networks
//! 3. If the target is visible: snapshot and clear all subscribers,
//!    tell each of them, exit
//! 4. Sleep, then repeat
//!
//! Notification is one-shot: after a restoration everyone has to
//! subscribe again, so a network that stays up does not spam anybody.

use crate::config::MonitorConfig;
use crate::messages;
use crate::notifier::Notifier;
use crate::prober::PresenceProber;
use crate::subscription::SubscriptionManager;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Monitor loop settings and collaborators
pub struct MonitorLoop {
    /// Scanner wrapper
    prober: PresenceProber,

    /// Delivers the restoration notice
    notifier: Notifier,

    /// Network name to wait for
    target: String,

    /// Sleep between cycles
    interval: Duration,

    /// Consecutive scan failures before pausing (0 disables)
    max_failures: u32,

    /// Sleep used instead of `interval` once `max_failures` is reached
    failure_pause: Duration,
}

impl MonitorLoop {
    /// Create a monitor loop without a failure pause
    pub fn new(
        prober: PresenceProber,
        notifier: Notifier,
        target: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            prober,
            notifier,
            target: target.into(),
            interval,
            max_failures: 0,
            failure_pause: interval,
        }
    }

    /// Create a monitor loop from configuration
    pub fn from_config(prober: PresenceProber, notifier: Notifier, config: &MonitorConfig) -> Self {
        Self::new(prober, notifier, config.wifi_name.clone(), config.active_check_interval())
            .with_failure_pause(config.max_failures, config.failure_pause())
    }

    /// Pause for `pause` after `max_failures` failed scans in a row
    pub fn with_failure_pause(mut self, max_failures: u32, pause: Duration) -> Self {
        self.max_failures = max_failures;
        self.failure_pause = pause;
        self
    }

    /// Network name this loop waits for
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Run until monitoring goes idle or the target is detected
    pub(crate) async fn run(self: Arc<Self>, manager: SubscriptionManager) {
        info!("Monitor loop started, waiting for network \"{}\"", self.target);

        loop {
            if !manager.continue_monitoring().await {
                info!("Monitor loop stopped: no subscribers");
                return;
            }

            let visible = self.prober.probe().await;

            if visible.contains(&self.target) {
                let recipients = manager.snapshot_and_clear().await;
                info!("Network \"{}\" is visible, notifying {} subscriber(s)",
                      self.target, recipients.len());

                self.notifier
                    .notify_all(&recipients, messages::POWER_RESTORED, Some(&messages::start_keyboard()))
                    .await;

                info!("Monitor loop finished after restoration");
                return;
            }

            let pause = self.next_pause();
            debug!("Network \"{}\" not visible, next check in {:?}", self.target, pause);
            tokio::time::sleep(pause).await;
        }
    }

    fn next_pause(&self) -> Duration {
        let failures = self.prober.consecutive_failures();
        if self.max_failures > 0 && failures >= self.max_failures {
            warn!("{} scan failures in a row, pausing checks for {:?}", failures, self.failure_pause);
            self.prober.reset_failures();
            return self.failure_pause;
        }
        self.interval
    }
}
