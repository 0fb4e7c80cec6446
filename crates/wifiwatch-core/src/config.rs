//! Configuration for wifiwatch
//!
//! Settings come from `KEY=VALUE` pairs: the process environment laid over
//! an optional `.env` file. Keys are case-insensitive and unknown keys are
//! ignored, so one env file can be shared with other tools.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default Telegram Bot API endpoint
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Main wifiwatch configuration
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct MonitorConfig {
    /// Network whose reappearance means the power is back
    pub wifi_name: String,

    /// Bot token
    /// ⚠️ NEVER log this value
    pub telegram_token: String,

    /// Chat ids allowed to subscribe and unsubscribe
    pub chat_ids: Vec<String>,

    /// `CHECK_INTERVAL`, accepted so existing env files keep validating
    ///
    /// Nothing schedules on it; the monitor loop runs at
    /// `active_check_interval_secs`.
    pub check_interval_secs: u64,

    /// Monitor loop cadence in seconds while someone is subscribed
    pub active_check_interval_secs: u64,

    /// Consecutive scan failures before the monitor loop pauses
    pub max_failures: u32,

    /// Length of that pause in seconds
    pub failure_pause_secs: u64,

    /// Wireless interface handed to the scanner
    pub wifi_interface: String,

    /// Upper bound on a single scan, in seconds
    pub scan_timeout_secs: u64,

    /// Server-side long-poll timeout, in seconds
    pub poll_timeout_secs: u64,

    /// Delay before retrying a failed poll, in seconds
    pub poll_backoff_secs: u64,

    /// Bot API base URL
    pub telegram_api_url: String,
}

// Custom Debug implementation that hides the bot token
impl fmt::Debug for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorConfig")
            .field("wifi_name", &self.wifi_name)
            .field("telegram_token", &"<REDACTED>")
            .field("chat_ids", &self.chat_ids)
            .field("check_interval_secs", &self.check_interval_secs)
            .field("active_check_interval_secs", &self.active_check_interval_secs)
            .field("max_failures", &self.max_failures)
            .field("failure_pause_secs", &self.failure_pause_secs)
            .field("wifi_interface", &self.wifi_interface)
            .field("scan_timeout_secs", &self.scan_timeout_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("poll_backoff_secs", &self.poll_backoff_secs)
            .field("telegram_api_url", &self.telegram_api_url)
            .finish()
    }
}

impl MonitorConfig {
    /// Create a configuration with defaults for everything but the
    /// two required settings
    pub fn new(wifi_name: impl Into<String>, telegram_token: impl Into<String>) -> Self {
        Self {
            wifi_name: wifi_name.into(),
            telegram_token: telegram_token.into(),
            chat_ids: Vec::new(),
            check_interval_secs: default_check_interval_secs(),
            active_check_interval_secs: default_active_check_interval_secs(),
            max_failures: default_max_failures(),
            failure_pause_secs: default_failure_pause_secs(),
            wifi_interface: default_wifi_interface(),
            scan_timeout_secs: default_scan_timeout_secs(),
            poll_timeout_secs: default_poll_timeout_secs(),
            poll_backoff_secs: default_poll_backoff_secs(),
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
        }
    }

    /// Set the allow-list
    pub fn with_chat_ids<I, S>(mut self, chat_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chat_ids = chat_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Build a configuration from `KEY=VALUE` pairs
    ///
    /// Later pairs win over earlier ones, so pass file entries first and
    /// process environment entries second.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_ascii_uppercase(), v.into()))
            .collect();

        let required = |key: &str| -> Result<String> {
            match vars.get(key).map(|v| v.trim()) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(Error::config(format!("{} is required", key))),
            }
        };

        let mut config = Self::new(required("WIFI_NAME")?, required("TELEGRAM_TOKEN")?);

        if let Some(raw) = vars.get("CHAT_IDS") {
            config.chat_ids = parse_chat_ids(raw)?;
        }
        if let Some(v) = parse_number(&vars, "CHECK_INTERVAL")? {
            config.check_interval_secs = v;
        }
        if let Some(v) = parse_number(&vars, "ACTIVE_CHECK_INTERVAL")? {
            config.active_check_interval_secs = v;
        }
        if let Some(v) = parse_number(&vars, "MAX_FAILURES")? {
            config.max_failures = v;
        }
        if let Some(v) = parse_number(&vars, "FAILURE_PAUSE")? {
            config.failure_pause_secs = v;
        }
        if let Some(v) = parse_number(&vars, "SCAN_TIMEOUT")? {
            config.scan_timeout_secs = v;
        }
        if let Some(v) = parse_number(&vars, "POLL_TIMEOUT")? {
            config.poll_timeout_secs = v;
        }
        if let Some(v) = parse_number(&vars, "POLL_BACKOFF")? {
            config.poll_backoff_secs = v;
        }
        if let Some(v) = vars.get("WIFI_INTERFACE").map(|v| v.trim()).filter(|v| !v.is_empty()) {
            config.wifi_interface = v.to_string();
        }
        if let Some(v) = vars.get("TELEGRAM_API_URL").map(|v| v.trim()).filter(|v| !v.is_empty()) {
            config.telegram_api_url = v.trim_end_matches('/').to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from the process environment over an optional env file
    ///
    /// A missing file is not an error; an unreadable one is.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        Self::from_vars(load_vars(env_file)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.wifi_name.trim().is_empty() {
            return Err(Error::config("WIFI_NAME cannot be empty"));
        }
        if self.telegram_token.trim().is_empty() {
            return Err(Error::config("TELEGRAM_TOKEN cannot be empty"));
        }

        let intervals = [
            ("CHECK_INTERVAL", self.check_interval_secs),
            ("ACTIVE_CHECK_INTERVAL", self.active_check_interval_secs),
            ("FAILURE_PAUSE", self.failure_pause_secs),
            ("SCAN_TIMEOUT", self.scan_timeout_secs),
            ("POLL_BACKOFF", self.poll_backoff_secs),
        ];
        for (key, value) in intervals {
            if value == 0 {
                return Err(Error::config(format!("{} must be > 0", key)));
            }
        }

        if !self.telegram_api_url.starts_with("https://")
            && !self.telegram_api_url.starts_with("http://")
        {
            return Err(Error::config(format!(
                "TELEGRAM_API_URL must use HTTP or HTTPS scheme. Got: {}",
                self.telegram_api_url
            )));
        }

        Ok(())
    }

    /// Monitor loop cadence
    pub fn active_check_interval(&self) -> Duration {
        Duration::from_secs(self.active_check_interval_secs)
    }

    /// Pause after too many consecutive scan failures
    pub fn failure_pause(&self) -> Duration {
        Duration::from_secs(self.failure_pause_secs)
    }

    /// Bound on a single scan
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    /// Server-side long-poll timeout
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    /// Delay before retrying a failed poll
    pub fn poll_backoff(&self) -> Duration {
        Duration::from_secs(self.poll_backoff_secs)
    }
}

/// Merge an optional env file with the process environment
///
/// Keys come back upper-cased; the process environment wins over the file.
/// The daemon reads its own settings (`LOG_LEVEL`, `LOG_FILE`) from the
/// same map it hands to [`MonitorConfig::from_vars`].
pub fn load_vars(env_file: Option<&Path>) -> Result<HashMap<String, String>> {
    let mut pairs = Vec::new();
    if let Some(path) = env_file
        && path.exists()
    {
        let contents = std::fs::read_to_string(path)?;
        pairs.extend(parse_env_file(&contents));
    }
    pairs.extend(std::env::vars());

    Ok(pairs
        .into_iter()
        .map(|(k, v)| (k.trim().to_ascii_uppercase(), v))
        .collect())
}

/// Parse the contents of a `.env` file into `(key, value)` pairs
///
/// Accepts `KEY=VALUE` lines, `#` comments, blank lines, an optional
/// `export ` prefix and values wrapped in matching single or double quotes.
/// Lines without `=` are skipped.
pub fn parse_env_file(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Parse `CHAT_IDS`: a JSON array of strings or numbers, or a comma list
fn parse_chat_ids(raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        let values: Vec<serde_json::Value> = serde_json::from_str(raw)
            .map_err(|e| Error::config(format!("CHAT_IDS: {}", e)))?;
        return values
            .into_iter()
            .map(|value| match value {
                serde_json::Value::String(s) => Ok(s.trim().to_string()),
                serde_json::Value::Number(n) => Ok(n.to_string()),
                other => Err(Error::config(format!(
                    "CHAT_IDS entries must be strings or numbers. Got: {}",
                    other
                ))),
            })
            .filter(|id| id.as_ref().map_or(true, |s| !s.is_empty()))
            .collect();
    }

    Ok(raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn parse_number<T: std::str::FromStr>(vars: &HashMap<String, String>, key: &str) -> Result<Option<T>> {
    match vars.get(key).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::config(format!("{} must be a non-negative integer. Got: {}", key, raw))),
    }
}

fn default_check_interval_secs() -> u64 {
    300
}

fn default_active_check_interval_secs() -> u64 {
    60
}

fn default_max_failures() -> u32 {
    3
}

fn default_failure_pause_secs() -> u64 {
    3600
}

fn default_wifi_interface() -> String {
    "wlan0".to_string()
}

fn default_scan_timeout_secs() -> u64 {
    30
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_poll_backoff_secs() -> u64 {
    10
}
