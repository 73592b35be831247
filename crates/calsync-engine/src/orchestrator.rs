//! The add-once operation.
//!
//! [`CalendarSync::add_event`] walks a fixed sequence and stops at the first
//! terminal outcome:
//!
//! ```text
//! ledger check ──hit──▶ AlreadyExists(Cache)
//!      │ miss
//!      ▼
//! permission ──denied──▶ PermissionDenied
//!      │ granted
//!      ▼
//! select calendar ──none──▶ NoCalendarAvailable
//!      │
//!      ▼
//! day sweep ──match──▶ AlreadyExists(Sweep)   (ledger back-filled)
//!      │ no match / sweep failed
//!      ▼
//! write ──error──▶ WriteFailed
//!      │
//!      ▼
//! Added                                        (ledger updated)
//! ```
//!
//! Nothing is retried. A failed call is only ever repeated by the caller
//! invoking `add_event` again, which starts over at the ledger check.

use std::fmt;
use std::sync::Arc;

use calsync_core::{Event, SyncKey};
use calsync_providers::{AccessStatus, CalendarProvider, ProviderError, normalize_event};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::cache::CacheStore;
use crate::config::SyncConfig;
use crate::detector::{DuplicateDetector, MatchRules};
use crate::error::{EngineError, EngineResult, SyncError};
use crate::locks::KeyedLocks;
use crate::notify::{LogNotifier, MessageBundle, Notice, Notifier};
use crate::permission::PermissionGate;
use crate::selector::{CalendarSelector, Selection};
use crate::store::KeyValueStore;
use crate::writer::CalendarWriter;

/// Which tier recognised an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateSource {
    /// The ledger recorded the event.
    Cache,
    /// A matching entry was found on the event's day.
    Sweep,
}

/// Terminal result of one `add_event` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// A new entry was written.
    Added {
        provider_id: String,
        calendar_id: String,
    },
    /// The event is already in the calendar; nothing was written.
    AlreadyExists { source: DuplicateSource },
    /// Calendar access was not granted.
    PermissionDenied,
    /// No calendar exists and none could be created.
    NoCalendarAvailable,
    /// The provider failed; `reason` is its message.
    WriteFailed { reason: String },
}

/// Successful outcomes, as returned by [`SyncOutcome::into_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSuccess {
    Added {
        provider_id: String,
        calendar_id: String,
    },
    AlreadyExists {
        source: DuplicateSource,
    },
}

impl SyncOutcome {
    /// Returns true for `Added` and `AlreadyExists`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Added { .. } | Self::AlreadyExists { .. })
    }

    /// Short machine-friendly name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::AlreadyExists { .. } => "already_exists",
            Self::PermissionDenied => "permission_denied",
            Self::NoCalendarAvailable => "no_calendar_available",
            Self::WriteFailed { .. } => "write_failed",
        }
    }

    /// Splits the outcome into success and error.
    pub fn into_result(self) -> Result<SyncSuccess, SyncError> {
        match self {
            Self::Added {
                provider_id,
                calendar_id,
            } => Ok(SyncSuccess::Added {
                provider_id,
                calendar_id,
            }),
            Self::AlreadyExists { source } => Ok(SyncSuccess::AlreadyExists { source }),
            Self::PermissionDenied => Err(SyncError::PermissionDenied),
            Self::NoCalendarAvailable => Err(SyncError::NoCalendarAvailable),
            Self::WriteFailed { reason } => Err(SyncError::WriteFailed(reason)),
        }
    }

    fn write_failed(error: &ProviderError) -> Self {
        Self::WriteFailed {
            reason: error.message().to_string(),
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added {
                provider_id,
                calendar_id,
            } => write!(f, "added as {} in calendar {}", provider_id, calendar_id),
            Self::AlreadyExists { source } => {
                let source = match source {
                    DuplicateSource::Cache => "cache",
                    DuplicateSource::Sweep => "sweep",
                };
                write!(f, "already in calendar (found by {})", source)
            }
            Self::PermissionDenied => f.write_str("calendar permission denied"),
            Self::NoCalendarAvailable => f.write_str("no calendar available"),
            Self::WriteFailed { reason } => write!(f, "write failed: {}", reason),
        }
    }
}

/// Adds events to a calendar at most once each.
pub struct CalendarSync {
    config: SyncConfig,
    cache: CacheStore,
    gate: PermissionGate,
    selector: CalendarSelector,
    detector: DuplicateDetector,
    writer: CalendarWriter,
    locks: KeyedLocks,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for CalendarSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarSync")
            .field("config", &self.config)
            .field("selector", &self.selector)
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}

impl CalendarSync {
    /// Wires the engine over a provider and a ledger store.
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        store: Arc<dyn KeyValueStore>,
        config: SyncConfig,
    ) -> EngineResult<Self> {
        if config.namespace.trim().is_empty() {
            return Err(EngineError::config("ledger namespace must not be empty"));
        }

        let timeout = config.provider_timeout();
        let cache = CacheStore::new(store, config.namespace.clone());
        let selector = CalendarSelector::for_platform(
            provider.clone(),
            config.platform,
            &config.cloud_source_pattern,
            timeout,
        )?;
        let rules = MatchRules::new(config.time_tolerance(), config.day_zone);
        let detector = DuplicateDetector::new(cache.clone(), provider.clone(), rules, timeout)
            .with_sweep(config.sweep_enabled);

        Ok(Self {
            gate: PermissionGate::new(provider.clone(), timeout),
            writer: CalendarWriter::new(provider, timeout),
            selector,
            detector,
            cache,
            locks: KeyedLocks::new(),
            notifier: Arc::new(LogNotifier),
            config,
        })
    }

    /// Builder: set where notices from `add_event_with_feedback` go.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the ledger.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Returns the calendar selector.
    pub fn selector(&self) -> &CalendarSelector {
        &self.selector
    }

    /// Returns true if the ledger records the event. Makes no provider call.
    pub fn is_synced(&self, event: &Event) -> bool {
        self.detector.is_recorded(&event.sync_key())
    }

    /// Adds the event unless it is already in the calendar.
    pub async fn add_event(&self, event: &Event) -> SyncOutcome {
        let key = event.sync_key();
        let span = info_span!("add_event", key = %key);
        async {
            let _guard = if self.config.serialize_per_key {
                Some(self.locks.lock(&key).await)
            } else {
                None
            };
            let outcome = self.run(event, &key).await;
            info!(outcome = outcome.label(), "Add event finished");
            outcome
        }
        .instrument(span)
        .await
    }

    /// Adds the event, then reports the outcome through the notifier.
    pub async fn add_event_with_feedback(&self, event: &Event, bundle: &MessageBundle) -> SyncOutcome {
        let outcome = self.add_event(event).await;
        let notice = Notice::for_outcome(&outcome, &event.name, bundle, self.config.platform);
        self.notifier.notify(&notice);
        outcome
    }

    async fn run(&self, event: &Event, key: &SyncKey) -> SyncOutcome {
        if self.detector.is_recorded(key) {
            debug!("Event found in ledger");
            return SyncOutcome::AlreadyExists {
                source: DuplicateSource::Cache,
            };
        }

        match self.gate.request_access().await {
            Ok(AccessStatus::Granted) => {}
            Ok(AccessStatus::Denied) => {
                info!("Calendar access denied");
                return SyncOutcome::PermissionDenied;
            }
            Err(e) => return SyncOutcome::write_failed(&e),
        }

        let selected = match self.selector.select_calendar().await {
            Ok(Selection::Selected(selected)) => selected,
            Ok(Selection::NoneFound) => {
                info!("No calendar available");
                return SyncOutcome::NoCalendarAvailable;
            }
            Err(e) => return SyncOutcome::write_failed(&e),
        };

        let entry = normalize_event(event);
        match self.detector.sweep(&entry, &selected.all_calendars).await {
            Ok(Some(existing)) => {
                info!(existing_id = %existing.id, "Matching entry already in calendar");
                self.cache.put(key);
                return SyncOutcome::AlreadyExists {
                    source: DuplicateSource::Sweep,
                };
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Duplicate sweep failed, continuing"),
        }

        let calendar_id = selected.calendar.id;
        match self.writer.insert(&calendar_id, &entry).await {
            Ok(provider_id) => {
                self.cache.put(key);
                SyncOutcome::Added {
                    provider_id,
                    calendar_id,
                }
            }
            Err(e) => SyncOutcome::write_failed(&e),
        }
    }
}
