//! In-memory calendar provider.
//!
//! [`MemoryProvider`] keeps calendars and entries in process memory. It
//! counts every call and can be told to deny access, fail individual
//! operations or respond slowly, which makes it the standard fake for engine
//! tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use calsync_core::CalendarEntryData;
use tracing::debug;

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::provider::{
    AccessStatus, BoxFuture, CalendarDescriptor, CalendarProvider, FetchOptions, NewCalendar,
};
use crate::record::ProviderEventRecord;

/// Number of calls made to each provider operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub request_access: usize,
    pub list_calendars: usize,
    pub fetch_events: usize,
    pub create_event: usize,
    pub create_calendar: usize,
}

impl CallCounts {
    /// Total number of calls to any operation.
    pub fn total(&self) -> usize {
        self.request_access
            + self.list_calendars
            + self.fetch_events
            + self.create_event
            + self.create_calendar
    }
}

#[derive(Debug, Default)]
struct Counters {
    request_access: AtomicUsize,
    list_calendars: AtomicUsize,
    fetch_events: AtomicUsize,
    create_event: AtomicUsize,
    create_calendar: AtomicUsize,
}

#[derive(Debug, Default)]
struct State {
    calendars: Vec<CalendarDescriptor>,
    events: Vec<ProviderEventRecord>,
    next_id: usize,
}

/// An operation that fails with a preset error.
#[derive(Debug, Clone)]
struct Failure {
    code: ProviderErrorCode,
    message: String,
}

impl Failure {
    fn from_error(error: &ProviderError) -> Self {
        Self {
            code: error.code(),
            message: error.message().to_string(),
        }
    }

    fn to_error(&self, provider: &str) -> ProviderError {
        ProviderError::new(self.code, &self.message).with_provider(provider)
    }
}

/// Calendar provider backed by process memory.
#[derive(Debug)]
pub struct MemoryProvider {
    name: String,
    access: AccessStatus,
    allow_calendar_creation: bool,
    latency: Option<Duration>,
    fail_access: Option<Failure>,
    fail_list: Option<Failure>,
    fail_fetch: Option<Failure>,
    fail_create_event: Option<Failure>,
    state: Mutex<State>,
    counters: Counters,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    /// Creates an empty provider that grants access and cannot create calendars.
    pub fn new() -> Self {
        Self {
            name: "memory".to_string(),
            access: AccessStatus::Granted,
            allow_calendar_creation: false,
            latency: None,
            fail_access: None,
            fail_list: None,
            fail_fetch: None,
            fail_create_event: None,
            state: Mutex::new(State::default()),
            counters: Counters::default(),
        }
    }

    /// Builder: answer permission requests with `access`.
    pub fn with_access(mut self, access: AccessStatus) -> Self {
        self.access = access;
        self
    }

    /// Builder: add a calendar.
    pub fn with_calendar(self, calendar: CalendarDescriptor) -> Self {
        self.lock().calendars.push(calendar);
        self
    }

    /// Builder: seed an existing entry.
    pub fn with_event(self, record: ProviderEventRecord) -> Self {
        self.lock().events.push(record);
        self
    }

    /// Builder: allow or forbid calendar creation.
    pub fn with_calendar_creation(mut self, allowed: bool) -> Self {
        self.allow_calendar_creation = allowed;
        self
    }

    /// Builder: delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Builder: make permission requests fail.
    pub fn failing_access(mut self, error: ProviderError) -> Self {
        self.fail_access = Some(Failure::from_error(&error));
        self
    }

    /// Builder: make calendar enumeration fail.
    pub fn failing_list(mut self, error: ProviderError) -> Self {
        self.fail_list = Some(Failure::from_error(&error));
        self
    }

    /// Builder: make entry enumeration fail.
    pub fn failing_fetch(mut self, error: ProviderError) -> Self {
        self.fail_fetch = Some(Failure::from_error(&error));
        self
    }

    /// Builder: make entry creation fail.
    pub fn failing_create_event(mut self, error: ProviderError) -> Self {
        self.fail_create_event = Some(Failure::from_error(&error));
        self
    }

    /// Returns a snapshot of the call counters.
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            request_access: self.counters.request_access.load(Ordering::SeqCst),
            list_calendars: self.counters.list_calendars.load(Ordering::SeqCst),
            fetch_events: self.counters.fetch_events.load(Ordering::SeqCst),
            create_event: self.counters.create_event.load(Ordering::SeqCst),
            create_calendar: self.counters.create_calendar.load(Ordering::SeqCst),
        }
    }

    /// Returns every stored entry.
    pub fn events(&self) -> Vec<ProviderEventRecord> {
        self.lock().events.clone()
    }

    /// Returns every calendar.
    pub fn calendars(&self) -> Vec<CalendarDescriptor> {
        self.lock().calendars.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }
}

impl CalendarProvider for MemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn request_access(&self) -> BoxFuture<'_, ProviderResult<AccessStatus>> {
        Box::pin(async move {
            self.counters.request_access.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            match &self.fail_access {
                Some(failure) => Err(failure.to_error(&self.name)),
                None => Ok(self.access),
            }
        })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>> {
        Box::pin(async move {
            self.counters.list_calendars.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            match &self.fail_list {
                Some(failure) => Err(failure.to_error(&self.name)),
                None => Ok(self.calendars()),
            }
        })
    }

    fn fetch_events(
        &self,
        options: FetchOptions,
    ) -> BoxFuture<'_, ProviderResult<Vec<ProviderEventRecord>>> {
        Box::pin(async move {
            self.counters.fetch_events.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            if let Some(failure) = &self.fail_fetch {
                return Err(failure.to_error(&self.name));
            }

            let mut found: Vec<_> = self
                .lock()
                .events
                .iter()
                .filter(|e| options.includes_calendar(&e.calendar_id))
                .filter(|e| options.window.overlaps(e.start, e.end.max(e.start)))
                .cloned()
                .collect();
            found.sort_by_key(|e| e.start);
            if let Some(max) = options.max_results {
                found.truncate(max);
            }
            Ok(found)
        })
    }

    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        entry: &'a CalendarEntryData,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(async move {
            self.counters.create_event.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            if let Some(failure) = &self.fail_create_event {
                return Err(failure.to_error(&self.name));
            }

            let calendar = self
                .lock()
                .calendars
                .iter()
                .find(|c| c.id == calendar_id)
                .cloned()
                .ok_or_else(|| {
                    ProviderError::not_found(format!("calendar '{}' does not exist", calendar_id))
                        .with_provider(&self.name)
                })?;
            if !calendar.writable {
                return Err(ProviderError::calendar(format!(
                    "calendar '{}' is read-only",
                    calendar.title
                ))
                .with_provider(&self.name));
            }

            let id = self.next_id("mem-event");
            let mut record = ProviderEventRecord::new(
                &id,
                calendar_id,
                &entry.title,
                entry.start,
                entry.end,
            );
            record.location = entry.location.clone();
            self.lock().events.push(record);
            debug!(id = %id, calendar_id = %calendar_id, "Created in-memory entry");
            Ok(id)
        })
    }

    fn create_calendar<'a>(&'a self, spec: &'a NewCalendar) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(async move {
            self.counters.create_calendar.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            if !self.allow_calendar_creation {
                return Err(ProviderError::unsupported(
                    "calendar creation is not allowed on this platform",
                )
                .with_provider(&self.name));
            }

            let id = self.next_id("mem-calendar");
            let calendar = CalendarDescriptor::new(&id, &spec.title).with_source(&spec.source_name);
            self.lock().calendars.push(calendar);
            debug!(id = %id, title = %spec.title, "Created in-memory calendar");
            Ok(id)
        })
    }
}
