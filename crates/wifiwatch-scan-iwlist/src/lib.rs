// # iwlist Network Scanner
//
// This crate provides a `NetworkScanner` that shells out to
// `iwlist <interface> scan` (wireless-tools, Linux).
//
// ## Output format
//
// iwlist prints one block per cell; the network name appears on a line
// like:
//
// ```text
//           Cell 01 - Address: 6C:60:EB:D4:63:48
//                     ESSID:"HomeNet"
// ```
//
// Every line containing `ESSID` contributes the text between its first
// pair of double quotes. Hidden networks (`ESSID:""`) and `ESSID:off/any`
// carry no usable name and are skipped.
//
// ## Constraints
//
// - One subprocess per `scan()` call; no retries, no sleeping
// - The child is killed if the caller drops the future (timeout)
// - Non-zero exit is an error; the prober turns it into an empty set

use async_trait::async_trait;
use std::collections::HashSet;
use std::process::Stdio;
use wifiwatch_core::traits::NetworkScanner;
use wifiwatch_core::{Error, Result};

/// Default scan program
const DEFAULT_PROGRAM: &str = "iwlist";

/// Marker token preceding the quoted network name
const ESSID_MARKER: &str = "ESSID";

/// Scanner backed by the `iwlist` command
#[derive(Debug, Clone)]
pub struct IwlistScanner {
    /// Program to run (normally `iwlist`)
    program: String,

    /// Wireless interface to scan
    interface: String,
}

impl IwlistScanner {
    /// Create a scanner for an interface
    pub fn new(interface: impl Into<String>) -> Self {
        Self::with_program(DEFAULT_PROGRAM, interface)
    }

    /// Create a scanner that runs a different program
    ///
    /// The program is invoked as `<program> <interface> scan`.
    pub fn with_program(program: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            interface: interface.into(),
        }
    }

    /// Interface this scanner targets
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

#[async_trait]
impl NetworkScanner for IwlistScanner {
    async fn scan(&self) -> Result<HashSet<String>> {
        let output = tokio::process::Command::new(&self.program)
            .arg(&self.interface)
            .arg("scan")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::scan(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::scan(format!(
                "{} {} scan exited with {}: {}",
                self.program,
                self.interface,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let networks = parse_scan_output(&stdout);
        tracing::debug!("{} reported {} named network(s)", self.program, networks.len());
        Ok(networks)
    }

    fn scanner_name(&self) -> &'static str {
        "iwlist"
    }
}

/// Extract network names from iwlist scan output
pub fn parse_scan_output(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter(|line| line.contains(ESSID_MARKER))
        .filter_map(|line| line.split('"').nth(1))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
