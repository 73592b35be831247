//! CalendarProvider trait definition.
//!
//! This module defines the [`CalendarProvider`] trait, the boundary between
//! the sync engine and a platform calendar service (the OS calendar store on
//! a phone, a directory of calendars on disk, an in-memory fake in tests).
//!
//! Every method is an await point. The engine treats each call as a single
//! OS round trip and bounds it with a timeout.

use std::future::Future;
use std::pin::Pin;

use calsync_core::{CalendarEntryData, TimeWindow};

use crate::error::{ProviderError, ProviderResult};
use crate::record::ProviderEventRecord;

/// Outcome of a calendar permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessStatus {
    /// Calendar access was granted.
    Granted,
    /// Calendar access was refused.
    Denied,
}

impl AccessStatus {
    /// Returns true if access was granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Read-only description of a calendar as enumerated from the provider.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CalendarDescriptor {
    /// Unique identifier for the calendar.
    pub id: String,
    /// Human-readable name of the calendar.
    pub title: String,
    /// Name of the account/source the calendar belongs to (e.g. "iCloud").
    pub source_name: Option<String>,
    /// Whether entries may be added to this calendar.
    pub writable: bool,
    /// Whether the provider flags this as the primary calendar.
    pub is_primary: bool,
}

impl CalendarDescriptor {
    /// Creates a writable, non-primary calendar with no source.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source_name: None,
            writable: true,
            is_primary: false,
        }
    }

    /// Builder method to set the source name.
    pub fn with_source(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }

    /// Builder method to set writability.
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Builder method to mark as primary.
    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    /// Returns the source name, or an empty string.
    pub fn source(&self) -> &str {
        self.source_name.as_deref().unwrap_or_default()
    }
}

/// Parameters for creating a calendar when none exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalendar {
    /// Calendar title.
    pub title: String,
    /// Display color (`#rrggbb`).
    pub color: String,
    /// Owner account name.
    pub owner_account: String,
    /// Source/account the calendar is attached to.
    pub source_name: String,
    /// Whether the source is a device-local account.
    pub local_account: bool,
}

impl NewCalendar {
    /// The device-local "Events" calendar created as a last resort.
    pub fn local_events() -> Self {
        Self {
            title: "Events".to_string(),
            color: "#0284c7".to_string(),
            owner_account: "Local".to_string(),
            source_name: "Local Calendar".to_string(),
            local_account: true,
        }
    }
}

/// Options for enumerating existing entries.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Time window to fetch entries for.
    pub window: TimeWindow,
    /// Only fetch entries from these calendars (empty means all).
    pub calendar_ids: Vec<String>,
    /// Maximum number of entries to return.
    pub max_results: Option<usize>,
}

impl FetchOptions {
    /// Creates fetch options for a time window across all calendars.
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            calendar_ids: Vec::new(),
            max_results: None,
        }
    }

    /// Builder method to filter by calendar IDs.
    pub fn with_calendar_ids(mut self, ids: Vec<String>) -> Self {
        self.calendar_ids = ids;
        self
    }

    /// Builder method to set max results.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Returns true if the given calendar is part of the query.
    pub fn includes_calendar(&self, calendar_id: &str) -> bool {
        self.calendar_ids.is_empty() || self.calendar_ids.iter().any(|id| id == calendar_id)
    }
}

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so the engine can hold an
/// `Arc<dyn CalendarProvider>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The platform calendar service.
///
/// # Implementation Notes
///
/// - `create_event` must perform exactly one create; it is *not* expected to
///   be idempotent. Deduplication happens above this trait.
/// - `fetch_events` returns entries overlapping the window, from the listed
///   calendars only.
/// - `create_calendar` is optional; platforms that forbid programmatic
///   calendar creation keep the default, which reports `Unsupported`.
pub trait CalendarProvider: Send + Sync {
    /// Returns the name/type of this provider (e.g., "memory", "local").
    fn name(&self) -> &str;

    /// Asks the user/OS for calendar access.
    fn request_access(&self) -> BoxFuture<'_, ProviderResult<AccessStatus>>;

    /// Lists available calendars.
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>>;

    /// Enumerates existing entries in a time window.
    fn fetch_events(
        &self,
        options: FetchOptions,
    ) -> BoxFuture<'_, ProviderResult<Vec<ProviderEventRecord>>>;

    /// Creates a calendar entry and returns its provider identifier.
    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        entry: &'a CalendarEntryData,
    ) -> BoxFuture<'a, ProviderResult<String>>;

    /// Creates a calendar and returns its identifier.
    fn create_calendar<'a>(&'a self, _spec: &'a NewCalendar) -> BoxFuture<'a, ProviderResult<String>> {
        let error = ProviderError::unsupported("calendar creation is not supported by this provider")
            .with_provider(self.name());
        Box::pin(async move { Err(error) })
    }
}

/// A provider that always returns an error.
///
/// Useful for testing failure paths and as a placeholder when a provider
/// fails to initialize.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    error: ProviderError,
}

impl ErrorProvider {
    /// Creates a new error provider.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn fail<T: Send + 'static>(&self) -> BoxFuture<'_, ProviderResult<T>> {
        let error = self.error.detached().with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}

impl CalendarProvider for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn request_access(&self) -> BoxFuture<'_, ProviderResult<AccessStatus>> {
        self.fail()
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>> {
        self.fail()
    }

    fn fetch_events(
        &self,
        _options: FetchOptions,
    ) -> BoxFuture<'_, ProviderResult<Vec<ProviderEventRecord>>> {
        self.fail()
    }

    fn create_event<'a>(
        &'a self,
        _calendar_id: &'a str,
        _entry: &'a CalendarEntryData,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        self.fail()
    }
}
