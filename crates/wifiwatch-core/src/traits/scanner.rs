// # Network Scanner Trait
//
// Defines the interface for listing visible wireless networks.
//
// ## Implementations
//
// - iwlist subprocess (Linux): `wifiwatch-scan-iwlist` crate
//
// ## Usage
//
// ```rust,ignore
// use wifiwatch_core::NetworkScanner;
//
// let scanner = /* NetworkScanner implementation */;
// let visible = scanner.scan().await?;
// if visible.contains("HomeNet") {
//     println!("power is back");
// }
// ```

use async_trait::async_trait;
use std::collections::HashSet;

/// Trait for network scanner implementations
///
/// A scanner performs exactly one scan per call and reports failure
/// honestly. It must not retry, sleep, or swallow errors: the
/// [`PresenceProber`](crate::PresenceProber) owns failure normalization
/// and the monitor loop owns the retry cadence.
#[async_trait]
pub trait NetworkScanner: Send + Sync {
    /// Scan once and return the names of all visible networks
    ///
    /// # Returns
    ///
    /// - `Ok(HashSet<String>)`: Visible network names (possibly empty)
    /// - `Err(Error)`: The scan could not be performed
    async fn scan(&self) -> Result<HashSet<String>, crate::Error>;

    /// Short name used in log lines
    fn scanner_name(&self) -> &'static str;
}
