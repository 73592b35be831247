//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/calsync/config.toml` by default:
//!
//! ```toml
//! notifier = "desktop"
//!
//! [sync]
//! platform = "ios"
//! day_zone = "local"
//!
//! [storage]
//! ledger_path = "/home/me/.local/share/calsync/ledger.json"
//!
//! [calendar]
//! dir = "/home/me/.local/share/calsync/calendars"
//! allow_calendar_creation = true
//!
//! [messages]
//! added_to_calendar = "Added to Calendar"
//! ```
//!
//! Command-line flags override file values.

use std::path::{Path, PathBuf};

use calsync_engine::{MessageBundle, SyncConfig};
use calsync_providers::AccessStatus;
use calsync_providers::local::LocalConfig;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};

/// Where notices about sync outcomes are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Log through tracing.
    #[default]
    Log,
    /// Desktop notifications.
    Desktop,
}

/// Configuration for the calsync client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Where notices go.
    pub notifier: NotifierKind,

    /// Sync engine settings.
    pub sync: SyncConfig,

    /// Ledger storage settings.
    pub storage: StorageSettings,

    /// Local calendar settings.
    pub calendar: CalendarSettings,

    /// Notice texts.
    pub messages: MessageBundle,
}

/// Ledger storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Path to the ledger file.
    pub ledger_path: Option<PathBuf>,
}

/// Local calendar directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Directory holding one sub-directory per calendar.
    pub dir: Option<PathBuf>,

    /// Answer given to permission requests.
    pub access: AccessStatus,

    /// Whether a calendar may be created when none exists.
    pub allow_calendar_creation: bool,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            dir: None,
            access: AccessStatus::Granted,
            allow_calendar_creation: true,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Applies command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if cli.debug {
            self.debug = true;
        }
        if let Some(platform) = cli.platform {
            self.sync.platform = platform;
        }
        if let Some(ref dir) = cli.calendar_dir {
            self.calendar.dir = Some(dir.clone());
        }
        if let Some(ref ledger) = cli.ledger {
            self.storage.ledger_path = Some(ledger.clone());
        }
        if cli.no_sweep {
            self.sync.sweep_enabled = false;
        }
    }

    /// Returns the ledger file path.
    pub fn ledger_path(&self) -> PathBuf {
        self.storage
            .ledger_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("ledger.json"))
    }

    /// Returns the local calendar directory.
    pub fn calendar_dir(&self) -> PathBuf {
        self.calendar
            .dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("calendars"))
    }

    /// Returns the local provider configuration.
    ///
    /// Calendar creation is only offered when the platform allows it.
    pub fn local_config(&self) -> LocalConfig {
        LocalConfig::new(self.calendar_dir())
            .with_access(self.calendar.access)
            .with_calendar_creation(
                self.calendar.allow_calendar_creation && self.sync.platform.can_create_calendars(),
            )
    }

    /// Checks settings that would only fail later at runtime.
    pub fn validate(&self) -> ClientResult<()> {
        if self.sync.namespace.trim().is_empty() {
            return Err(ClientError::Config("sync.namespace must not be empty".into()));
        }
        calsync_engine::ranking_for(self.sync.platform, &self.sync.cloud_source_pattern)?;
        let dir = self.calendar_dir();
        if dir.exists() && !dir.is_dir() {
            return Err(ClientError::Config(format!(
                "calendar.dir is not a directory: {}",
                dir.display()
            )));
        }
        Ok(())
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calsync")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calsync")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsync_core::DayZone;
    use calsync_engine::Platform;
    use clap::Parser;

    #[test]
    fn empty_file_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.notifier, NotifierKind::Log);
        assert!(config.sync.sweep_enabled);
        assert_eq!(config.calendar.access, AccessStatus::Granted);
        assert_eq!(config.messages, MessageBundle::default());
    }

    #[test]
    fn parses_all_sections() {
        let toml_content = r#"
notifier = "desktop"

[sync]
platform = "ios"
day_zone = "+02:00"
provider_timeout_secs = 3

[storage]
ledger_path = "/tmp/ledger.json"

[calendar]
dir = "/tmp/cals"
access = "denied"

[messages]
added_to_calendar = "Ajouté"
event_already_exists = "Déjà dans le calendrier"
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.notifier, NotifierKind::Desktop);
        assert_eq!(config.sync.platform, Platform::Ios);
        assert_eq!(config.sync.day_zone, "+02:00".parse::<DayZone>().unwrap());
        assert_eq!(config.sync.provider_timeout_secs, 3);
        assert_eq!(config.ledger_path(), PathBuf::from("/tmp/ledger.json"));
        assert_eq!(config.calendar_dir(), PathBuf::from("/tmp/cals"));
        assert_eq!(config.calendar.access, AccessStatus::Denied);
        assert_eq!(config.messages.added_to_calendar, "Ajouté");
        assert_eq!(config.messages.calendar_error, "Calendar Error");
    }

    #[test]
    fn cli_overrides_file() {
        let mut config: ClientConfig = toml::from_str("[sync]\nplatform = \"android\"\n").unwrap();
        let cli = Cli::try_parse_from([
            "calsync",
            "--platform",
            "ios",
            "--ledger",
            "/x/ledger.json",
            "--calendar-dir",
            "/x/cals",
            "--no-sweep",
            "ledger",
            "list",
        ])
        .unwrap();
        config.apply_cli(&cli);

        assert_eq!(config.sync.platform, Platform::Ios);
        assert!(!config.sync.sweep_enabled);
        assert_eq!(config.ledger_path(), PathBuf::from("/x/ledger.json"));
        assert_eq!(config.calendar_dir(), PathBuf::from("/x/cals"));
    }

    #[test]
    fn ios_never_offers_calendar_creation() {
        let mut config = ClientConfig::default();
        assert!(config.local_config().allow_calendar_creation);

        config.sync.platform = Platform::Ios;
        assert!(!config.local_config().allow_calendar_creation);
    }

    #[test]
    fn validate_rejects_bad_pattern() {
        let mut config = ClientConfig::default();
        config.calendar.dir = Some(PathBuf::from("/nonexistent/calsync-test"));
        assert!(config.validate().is_ok());

        config.sync.cloud_source_pattern = "(".into();
        assert!(matches!(config.validate(), Err(ClientError::Engine(_))));
    }

    #[test]
    fn dump_round_trips() {
        let config = ClientConfig::default();
        let dumped = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&dumped).unwrap();
        assert_eq!(parsed.sync, config.sync);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nledger_path = \"/y/ledger.json\"\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.ledger_path(), PathBuf::from("/y/ledger.json"));
        assert!(ClientConfig::load_from(&dir.path().join("missing.toml")).is_err());
    }
}
