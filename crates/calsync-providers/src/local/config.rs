//! Local calendar directory configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::provider::{AccessStatus, CalendarDescriptor};

/// Name of the per-calendar metadata file.
pub const CALENDAR_META_FILE: &str = "calendar.toml";

/// Configuration for a [`LocalProvider`](super::LocalProvider).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Directory holding one sub-directory per calendar.
    pub root: PathBuf,
    /// Answer given to permission requests.
    #[serde(default = "default_access")]
    pub access: AccessStatus,
    /// Whether a calendar may be created when none exists.
    #[serde(default)]
    pub allow_calendar_creation: bool,
}

fn default_access() -> AccessStatus {
    AccessStatus::Granted
}

impl LocalConfig {
    /// Creates a configuration for the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            access: AccessStatus::Granted,
            allow_calendar_creation: false,
        }
    }

    /// Builder: set the permission answer.
    pub fn with_access(mut self, access: AccessStatus) -> Self {
        self.access = access;
        self
    }

    /// Builder: allow or forbid calendar creation.
    pub fn with_calendar_creation(mut self, allowed: bool) -> Self {
        self.allow_calendar_creation = allowed;
        self
    }

    /// Returns the directory of a calendar.
    pub fn calendar_dir(&self, calendar_id: &str) -> PathBuf {
        self.root.join(calendar_id)
    }
}

/// Contents of `calendar.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarMeta {
    /// Display title; defaults to the directory name.
    pub title: Option<String>,
    /// Account/source name.
    pub source: Option<String>,
    /// Set to true to make the calendar read-only.
    pub read_only: bool,
    /// Whether this is the primary calendar.
    pub primary: bool,
}

impl CalendarMeta {
    /// Builds the descriptor for a calendar stored in `dir`.
    pub fn into_descriptor(self, dir: &Path) -> Option<CalendarDescriptor> {
        let id = dir.file_name()?.to_str()?.to_string();
        let title = self.title.unwrap_or_else(|| id.clone());
        let mut descriptor = CalendarDescriptor::new(id, title)
            .with_writable(!self.read_only)
            .with_primary(self.primary);
        descriptor.source_name = self.source;
        Some(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_from_toml() {
        let config: LocalConfig = toml::from_str(r#"root = "/tmp/cals""#).unwrap();
        assert_eq!(config.access, AccessStatus::Granted);
        assert!(!config.allow_calendar_creation);
        assert_eq!(config.calendar_dir("work"), PathBuf::from("/tmp/cals/work"));
    }

    #[test]
    fn meta_to_descriptor() {
        let meta: CalendarMeta = toml::from_str(
            r#"
            title = "Personal"
            source = "iCloud"
            primary = true
            "#,
        )
        .unwrap();
        let descriptor = meta.into_descriptor(Path::new("/cals/personal")).unwrap();
        assert_eq!(descriptor.id, "personal");
        assert_eq!(descriptor.title, "Personal");
        assert_eq!(descriptor.source(), "iCloud");
        assert!(descriptor.writable);
        assert!(descriptor.is_primary);
    }

    #[test]
    fn empty_meta_uses_directory_name() {
        let descriptor = CalendarMeta::default()
            .into_descriptor(Path::new("/cals/work"))
            .unwrap();
        assert_eq!(descriptor.title, "work");
        assert!(descriptor.source_name.is_none());
    }
}
