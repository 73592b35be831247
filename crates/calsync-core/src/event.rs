//! Event data model.
//!
//! This module provides the domain [`Event`] supplied by the backend, the
//! [`SyncKey`] that identifies a logical event for deduplication, and the
//! provider-agnostic [`CalendarEntryData`] that is written to a calendar.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An ISO-8601 timestamp that remembers the exact string it was parsed from.
///
/// The raw string takes part in [`SyncKey`] construction, so two timestamps
/// that denote the same instant but are spelled differently are *not*
/// interchangeable for deduplication purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    raw: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    /// Parses an ISO-8601 timestamp.
    ///
    /// Accepts RFC 3339 (`2025-08-15T09:00:00Z`, `2025-08-15T11:00:00+02:00`),
    /// offset-less date-times (read as UTC) and bare dates (midnight UTC).
    pub fn parse(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        let trimmed = raw.trim();

        let instant = if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            dt.with_timezone(&Utc)
        } else if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            naive.and_utc()
        } else if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M") {
            naive.and_utc()
        } else {
            match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                Ok(date) => date
                    .and_hms_opt(0, 0, 0)
                    .map(|naive| naive.and_utc())
                    .ok_or_else(|| CoreError::invalid_timestamp(&raw, "date out of range"))?,
                Err(e) => return Err(CoreError::invalid_timestamp(&raw, e.to_string())),
            }
        };

        Ok(Self { raw, instant })
    }

    /// Returns the timestamp exactly as it was received.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed instant in UTC.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl TryFrom<String> for Timestamp {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for Timestamp {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.raw
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The club organizing an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    pub name: String,
}

/// An event as supplied by the backend REST API.
///
/// Events are immutable from this crate's point of view: nothing here ever
/// modifies one. Unknown fields in the JSON payload are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Backend identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// When the event starts.
    pub event_start: Timestamp,
    /// When the event ends.
    pub event_end: Timestamp,
    /// Physical or virtual location, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Organizing club, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<Club>,
    /// Number of seats offered.
    #[serde(default)]
    pub seats_available: u32,
    /// Registration opens.
    pub registration_start: Timestamp,
    /// Registration closes.
    pub registration_end: Timestamp,
}

impl Event {
    /// Creates an event with the required fields.
    ///
    /// The registration window defaults to the event start until set with
    /// [`Event::with_registration_window`].
    pub fn new(id: u64, name: impl Into<String>, event_start: Timestamp, event_end: Timestamp) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            registration_start: event_start.clone(),
            registration_end: event_start.clone(),
            event_start,
            event_end,
            location: None,
            club: None,
            seats_available: 0,
        }
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the organizing club.
    pub fn with_club(mut self, name: impl Into<String>) -> Self {
        self.club = Some(Club { name: name.into() });
        self
    }

    /// Builder method to set the number of seats.
    pub fn with_seats_available(mut self, seats: u32) -> Self {
        self.seats_available = seats;
        self
    }

    /// Builder method to set the registration window.
    pub fn with_registration_window(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.registration_start = start;
        self.registration_end = end;
        self
    }

    /// Returns the location, treating blank strings as absent.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.trim().is_empty())
    }

    /// Returns the organizer name, treating blank strings as absent.
    pub fn organizer(&self) -> Option<&str> {
        self.club
            .as_ref()
            .map(|c| c.name.as_str())
            .filter(|n| !n.trim().is_empty())
    }

    /// Returns the key identifying this logical event.
    pub fn sync_key(&self) -> SyncKey {
        SyncKey::for_event(self)
    }
}

/// Identifies a logical event: the triple (id, name, raw start string).
///
/// The key is an exact composite, not a hash. Renaming or rescheduling an
/// event therefore yields a new key, and the event is added again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncKey(String);

impl SyncKey {
    /// Builds the key for an event.
    pub fn for_event(event: &Event) -> Self {
        Self(format!(
            "{}:{}:{}",
            event.id,
            event.name,
            event.event_start.as_str()
        ))
    }

    /// Wraps an already-formatted key (e.g. one read back from storage).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Event> for SyncKey {
    fn from(event: &Event) -> Self {
        Self::for_event(event)
    }
}

/// Provider-agnostic description of a calendar entry to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntryData {
    /// Entry title, including the marker glyph.
    pub title: String,
    /// Entry start.
    pub start: DateTime<Utc>,
    /// Entry end.
    pub end: DateTime<Utc>,
    /// Entry location.
    pub location: Option<String>,
    /// Multi-line notes.
    pub notes: String,
}

impl CalendarEntryData {
    /// Returns the entry duration in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}
