//! Presence prober
//!
//! Wraps a [`NetworkScanner`] so that callers always get a set back. A
//! failed or timed-out scan is logged and reported as "nothing visible";
//! the caller's own cadence decides when to try again.

use crate::traits::NetworkScanner;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Failure-normalizing wrapper around a network scanner
pub struct PresenceProber {
    scanner: Box<dyn NetworkScanner>,
    timeout: Duration,
    consecutive_failures: AtomicU32,
}

impl PresenceProber {
    /// Create a prober with a per-scan timeout
    pub fn new(scanner: Box<dyn NetworkScanner>, timeout: Duration) -> Self {
        Self {
            scanner,
            timeout,
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// Scan once; never fails
    ///
    /// Returns the visible network names, or an empty set if the scan
    /// failed or exceeded the timeout.
    pub async fn probe(&self) -> HashSet<String> {
        let outcome = tokio::time::timeout(self.timeout, self.scanner.scan()).await;

        match outcome {
            Ok(Ok(networks)) => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
                debug!("{} scan found {} network(s): {:?}",
                       self.scanner.scanner_name(), networks.len(), networks);
                networks
            }
            Ok(Err(e)) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!("Scan failed ({} in a row): {}", failures, e);
                HashSet::new()
            }
            Err(_) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!("Scan timed out after {:?} ({} in a row)", self.timeout, failures);
                HashSet::new()
            }
        }
    }

    /// Number of failed probes since the last successful one
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Forget past failures
    pub fn reset_failures(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }
}
