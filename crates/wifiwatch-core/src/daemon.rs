//! Daemon supervisor
//!
//! Wires the collaborators together and supervises the two long-lived
//! activities:
//!
//! ```text
//!                    ┌──────────────────┐
//!   transport ──────▶│  CommandPoller   │── subscribe/unsubscribe ──┐
//!                    └──────────────────┘                           ▼
//!                                                      ┌─────────────────────┐
//!                                                      │ SubscriptionManager │
//!                                                      └─────────────────────┘
//!                    ┌──────────────────┐    spawns on first         │
//!   scanner ────────▶│   MonitorLoop    │◀── subscriber ─────────────┘
//!                    └──────────────────┘
//! ```
//!
//! On startup every allowed chat is told the bot is up and offered the
//! start button. The poller then runs for the life of the daemon. The
//! monitor loop is started on demand by the subscription manager and
//! retires itself.

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::messages;
use crate::monitor::MonitorLoop;
use crate::notifier::Notifier;
use crate::poller::CommandPoller;
use crate::prober::PresenceProber;
use crate::subscription::SubscriptionManager;
use crate::traits::{MessageTransport, NetworkScanner, RecipientId};
use std::sync::Arc;
use tracing::info;

/// Top-level supervisor
///
/// ## Lifecycle
///
/// 1. Create with [`Daemon::new()`]
/// 2. Start with [`Daemon::run()`]
/// 3. Runs until a shutdown signal is received
pub struct Daemon {
    poller: CommandPoller,
    manager: SubscriptionManager,
    notifier: Notifier,
    allow_list: Vec<RecipientId>,
}

impl Daemon {
    /// Create a daemon
    ///
    /// # Parameters
    ///
    /// - `scanner`: Network scanner implementation
    /// - `transport`: Messaging transport implementation
    /// - `config`: Validated configuration
    pub fn new(
        scanner: Box<dyn NetworkScanner>,
        transport: Arc<dyn MessageTransport>,
        config: &MonitorConfig,
    ) -> Result<Self> {
        config.validate()?;

        let notifier = Notifier::new(Arc::clone(&transport));
        let prober = PresenceProber::new(scanner, config.scan_timeout());
        let monitor = MonitorLoop::from_config(prober, notifier.clone(), config);
        let manager = SubscriptionManager::new(notifier.clone(), monitor);
        let poller = CommandPoller::from_config(transport, manager.clone(), config);
        let allow_list = config.chat_ids.iter().map(|id| RecipientId::from(id.as_str())).collect();

        Ok(Self {
            poller,
            manager,
            notifier,
            allow_list,
        })
    }

    /// Handle to the shared subscription state
    pub fn manager(&self) -> SubscriptionManager {
        self.manager.clone()
    }

    /// Run until Ctrl-C
    pub async fn run(self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run until `shutdown_rx` resolves (or Ctrl-C, if `None`)
    ///
    /// The daemon binary feeds SIGTERM/SIGINT through this; tests use it
    /// for controlled shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        mut self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        info!("Daemon started");

        self.notifier
            .notify_all(&self.allow_list, messages::MONITOR_STARTED, Some(&messages::start_keyboard()))
            .await;

        match shutdown_rx {
            Some(rx) => {
                tokio::select! {
                    _ = self.poller.run() => {}
                    _ = rx => {
                        info!("Shutdown signal received");
                    }
                }
            }
            None => {
                tokio::select! {
                    _ = self.poller.run() => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown signal received");
                    }
                }
            }
        }

        self.manager.shutdown().await;
        info!("Daemon stopped");

        Ok(())
    }
}
