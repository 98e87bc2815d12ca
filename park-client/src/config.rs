//! Client configuration

use chrono::{FixedOffset, Offset, Utc, Weekday};
use std::path::PathBuf;
use std::time::Duration;

/// Firestore REST endpoint root
pub const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";

/// Simulated payment success rate when none (or an unusable one) is given
pub const DEFAULT_PAYMENT_SUCCESS_RATE: f64 = 0.9;

/// Clamp a success rate into `[0, 1]`; NaN and infinities fall back to the default
pub fn normalize_success_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        DEFAULT_PAYMENT_SUCCESS_RATE
    }
}

/// Client configuration for the parking backend and local state
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Documents root, e.g.
    /// `https://firestore.googleapis.com/v1/projects/p/databases/(default)/documents`
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Directory holding the local redb file
    pub data_dir: String,

    /// Daily rolling log files go here when set
    pub log_dir: Option<String>,

    pub log_level: String,

    /// Day of the week on which lots are closed
    pub closed_weekday: Weekday,

    /// Local UTC offset in minutes, used for weekday and opening-hours checks
    pub utc_offset_minutes: i32,

    /// Connectivity probe interval in seconds
    pub probe_interval: u64,

    /// Connectivity state assumed before the first probe
    pub initially_connected: bool,

    /// Probability that a simulated payment succeeds
    pub payment_success_rate: f64,
}

impl ClientConfig {
    /// Create a configuration pointing at a documents root
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: 15,
            data_dir: "./data".into(),
            log_dir: None,
            log_level: "info".into(),
            closed_weekday: Weekday::Sun,
            utc_offset_minutes: -300,
            probe_interval: 10,
            initially_connected: true,
            payment_success_rate: DEFAULT_PAYMENT_SUCCESS_RATE,
        }
    }

    /// Documents root of a Firestore project's default database
    pub fn firestore(project_id: &str) -> Self {
        Self::new(format!(
            "{}/projects/{}/databases/(default)/documents",
            FIRESTORE_API, project_id
        ))
    }

    /// Load configuration from `PARK_*` environment variables
    ///
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = match std::env::var("PARK_DOCUMENTS_URL") {
            Ok(url) => Self::new(url),
            Err(_) => Self::firestore(
                &std::env::var("PARK_PROJECT_ID").unwrap_or_else(|_| "seneparking".into()),
            ),
        };

        config.timeout = std::env::var("PARK_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.timeout);
        config.data_dir = std::env::var("PARK_DATA_DIR").unwrap_or(config.data_dir);
        config.log_dir = std::env::var("PARK_LOG_DIR").ok();
        config.log_level = std::env::var("PARK_LOG_LEVEL").unwrap_or(config.log_level);
        config.closed_weekday = std::env::var("PARK_CLOSED_WEEKDAY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.closed_weekday);
        config.utc_offset_minutes = std::env::var("PARK_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.utc_offset_minutes);
        config.probe_interval = std::env::var("PARK_PROBE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.probe_interval);
        config.initially_connected = std::env::var("PARK_INITIALLY_CONNECTED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.initially_connected);
        config.payment_success_rate = std::env::var("PARK_PAYMENT_SUCCESS_RATE")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(normalize_success_rate)
            .unwrap_or(config.payment_success_rate);

        config
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<String>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<String>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_closed_weekday(mut self, weekday: Weekday) -> Self {
        self.closed_weekday = weekday;
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn with_probe_interval(mut self, seconds: u64) -> Self {
        self.probe_interval = seconds;
        self
    }

    pub fn with_initially_connected(mut self, connected: bool) -> Self {
        self.initially_connected = connected;
        self
    }

    pub fn with_payment_success_rate(mut self, rate: f64) -> Self {
        self.payment_success_rate = normalize_success_rate(rate);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn probe_period(&self) -> Duration {
        Duration::from_secs(self.probe_interval.max(1))
    }

    /// Local offset; out-of-range values fall back to UTC
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    /// Path of the local database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("park-client.redb")
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::firestore("seneparking")
    }
}
