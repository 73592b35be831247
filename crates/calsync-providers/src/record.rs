//! Existing calendar entries as reported by a provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entry already present in a provider calendar.
///
/// Records are only ever compared against; the sync engine never owns or
/// modifies them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEventRecord {
    /// Provider-specific entry identifier.
    pub id: String,
    /// Calendar holding the entry.
    pub calendar_id: String,
    /// Entry title as stored by the provider.
    pub title: String,
    /// Entry start.
    pub start: DateTime<Utc>,
    /// Entry end.
    pub end: DateTime<Utc>,
    /// Entry location, if any.
    pub location: Option<String>,
}

impl ProviderEventRecord {
    /// Creates a record with the required fields.
    pub fn new(
        id: impl Into<String>,
        calendar_id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            title: title.into(),
            start,
            end,
            location: None,
        }
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
