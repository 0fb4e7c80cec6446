// # wifiwatch-core
//
// Core library for the wifiwatch power-restoration monitor.
//
// A home wireless network disappears when the power goes out and comes
// back when it is restored. This crate watches for the network to
// reappear and tells everyone who asked to be told, exactly once.
//
// ## Architecture Overview
//
// - **NetworkScanner**: Trait for listing visible wireless networks
// - **MessageTransport**: Trait for sending and receiving bot messages
// - **PresenceProber**: Wraps a scanner; failures become an empty result
// - **Notifier**: Delivers texts to one or many recipients
// - **SubscriptionManager**: Owns the subscriber set and monitoring state
// - **MonitorLoop**: Probes on a cadence and broadcasts restoration
// - **CommandPoller**: Long-polls for operator commands
// - **Daemon**: Supervises the poller and the monitor task
//
// ## Concurrency
//
// The command poller and the monitor loop run as separate tokio tasks and
// share one mutex-guarded state container. Every read-modify-write of the
// subscriber set happens inside a single critical section; network I/O
// never happens while the lock is held.

pub mod traits;
pub mod config;
pub mod error;
pub mod messages;
pub mod prober;
pub mod notifier;
pub mod subscription;
pub mod monitor;
pub mod poller;
pub mod daemon;

// Re-export core types for convenience
pub use traits::{NetworkScanner, MessageTransport, InboundUpdate, InboundMessage, ReplyKeyboard, RecipientId};
pub use config::MonitorConfig;
pub use error::{Error, Result};
pub use prober::PresenceProber;
pub use notifier::{Notifier, DeliveryResult};
pub use subscription::{SubscriptionManager, MonitoringState};
pub use monitor::MonitorLoop;
pub use poller::{CommandPoller, Command, UpdateCursor};
pub use daemon::Daemon;
