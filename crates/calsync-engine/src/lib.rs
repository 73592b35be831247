//! Add-once sync engine: ledger, calendar selection, duplicate detection.
//!
//! This crate adds backend events to a calendar at most once each:
//! - A persistent ledger of synced events over any key-value store
//! - Permission gating and platform-specific calendar selection
//! - A day sweep that recognises entries the ledger does not know about
//! - Per-event locking so concurrent adds cannot race each other
//! - User-facing notices for every outcome
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use calsync_core::{Event, Timestamp};
//! use calsync_engine::{CalendarSync, MemoryStore, SyncConfig};
//! use calsync_providers::{CalendarDescriptor, MemoryProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = MemoryProvider::new().with_calendar(CalendarDescriptor::new("personal", "Personal"));
//!     let sync = CalendarSync::new(
//!         Arc::new(provider),
//!         Arc::new(MemoryStore::new()),
//!         SyncConfig::default(),
//!     )?;
//!
//!     let event = Event::new(
//!         1,
//!         "Tech Conference 2025",
//!         Timestamp::parse("2025-08-15T09:00:00Z")?,
//!         Timestamp::parse("2025-08-15T17:00:00Z")?,
//!     );
//!     println!("{}", sync.add_event(&event).await);
//!     Ok(())
//! }
//! ```

mod bounded;
mod cache;
mod config;
mod detector;
mod error;
mod locks;
mod notify;
mod orchestrator;
mod permission;
mod selector;
mod store;
mod writer;

pub use cache::CacheStore;
pub use config::{DEFAULT_CLOUD_SOURCE_PATTERN, DEFAULT_NAMESPACE, Platform, SyncConfig};
pub use detector::{DuplicateDetector, MatchAssessment, MatchRules, MatchSubject, normalize_title};
pub use error::{EngineError, EngineResult, StoreError, StoreResult, SweepCheckFailed, SyncError};
pub use locks::{KeyGuard, KeyedLocks};
pub use notify::{
    DesktopNotifier, LogNotifier, MemoryNotifier, MessageBundle, Notice, NoticeAction, NoticeKind,
    Notifier,
};
pub use orchestrator::{CalendarSync, DuplicateSource, SyncOutcome, SyncSuccess};
pub use permission::PermissionGate;
pub use selector::{
    CalendarRanking, CalendarSelector, DefaultSourceRanking, PrimaryRanking, SelectedCalendar,
    Selection, ranking_for,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use writer::CalendarWriter;
