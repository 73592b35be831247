//! Sync engine configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use calsync_core::DayZone;
use serde::{Deserialize, Serialize};

/// Default ledger namespace.
pub const DEFAULT_NAMESPACE: &str = "calsync:calendar-events";

/// Default pattern matching cloud-backed calendar sources.
pub const DEFAULT_CLOUD_SOURCE_PATTERN: &str = "(?i)google";

/// Calendar platform conventions the engine follows.
///
/// The platform decides how a calendar is chosen and whether one may be
/// created when the device has none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Calendars come from named sources ("Default", "iCloud"); apps may not
    /// create calendars.
    Ios,
    /// Calendars carry a primary flag and an account; apps may create a
    /// local calendar.
    #[default]
    Android,
}

impl Platform {
    /// Returns true if a calendar may be created when none exists.
    pub fn can_create_calendars(&self) -> bool {
        matches!(self, Self::Android)
    }

    /// Returns the platform name used in config files and flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            other => Err(format!("unknown platform '{}' (expected ios or android)", other)),
        }
    }
}

/// Configuration for [`CalendarSync`](crate::CalendarSync).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Platform conventions for calendar selection.
    pub platform: Platform,

    /// Whether to sweep the event's day for look-alike entries on a ledger miss.
    pub sweep_enabled: bool,

    /// Serialize concurrent calls for the same event.
    pub serialize_per_key: bool,

    /// Upper bound for each provider call, in seconds.
    pub provider_timeout_secs: u64,

    /// Maximum start-time difference for a fuzzy match, in minutes.
    pub time_tolerance_minutes: u32,

    /// Zone in which calendar days are computed.
    pub day_zone: DayZone,

    /// Regex matched against calendar source names when ranking by account.
    pub cloud_source_pattern: String,

    /// Prefix of every ledger key.
    pub namespace: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            sweep_enabled: true,
            serialize_per_key: true,
            provider_timeout_secs: 10,
            time_tolerance_minutes: 90,
            day_zone: DayZone::Local,
            cloud_source_pattern: DEFAULT_CLOUD_SOURCE_PATTERN.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl SyncConfig {
    /// Creates a configuration for the given platform.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            ..Default::default()
        }
    }

    /// Builder: enable or disable the day sweep.
    pub fn with_sweep(mut self, enabled: bool) -> Self {
        self.sweep_enabled = enabled;
        self
    }

    /// Builder: enable or disable per-event serialization.
    pub fn with_serialize_per_key(mut self, enabled: bool) -> Self {
        self.serialize_per_key = enabled;
        self
    }

    /// Builder: set the provider call timeout.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Builder: set the fuzzy-match time tolerance in minutes.
    pub fn with_time_tolerance_minutes(mut self, minutes: u32) -> Self {
        self.time_tolerance_minutes = minutes;
        self
    }

    /// Builder: set the day zone.
    pub fn with_day_zone(mut self, zone: DayZone) -> Self {
        self.day_zone = zone;
        self
    }

    /// Builder: set the cloud-source pattern.
    pub fn with_cloud_source_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.cloud_source_pattern = pattern.into();
        self
    }

    /// Builder: set the ledger namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Returns the provider call timeout.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs.max(1))
    }

    /// Returns the fuzzy-match time tolerance.
    pub fn time_tolerance(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.time_tolerance_minutes))
    }
}
