//! Core types: events, sync keys, calendar entries, day windows, tracing

pub mod error;
pub mod event;
pub mod time;
pub mod tracing;

pub use error::CoreError;
pub use event::{CalendarEntryData, Club, Event, SyncKey, Timestamp};
pub use time::{DayZone, TimeWindow};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
