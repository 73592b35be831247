//! CalendarProvider trait and implementations.
//!
//! This crate provides the boundary between the sync engine and a platform
//! calendar service:
//!
//! - [`CalendarProvider`] - The trait every calendar backend implements
//! - [`ProviderEventRecord`] - Entries already present in a calendar
//! - [`normalize_event`] - Conversion from a backend event to calendar entry data
//! - [`ProviderError`] - Error types for provider operations
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────┐  normalize_event()  ┌───────────────────┐
//!   │  Event   │ ──────────────────▶ │ CalendarEntryData │
//!   └──────────┘                     └─────────┬─────────┘
//!                                              │ create_event()
//!                                              ▼
//!                              ┌───────────────────────────────┐
//!                              │       CalendarProvider        │
//!                              ├───────────────┬───────────────┤
//!                              │ MemoryProvider│ LocalProvider │
//!                              └───────────────┴───────────────┘
//! ```

pub mod error;
#[cfg(feature = "local")]
pub mod local;
pub mod memory;
pub mod normalize;
pub mod provider;
pub mod record;

// Re-export main types at crate root
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use memory::{CallCounts, MemoryProvider};
pub use normalize::{ENTRY_MARKER, normalize_event, strip_marker};
pub use provider::{
    AccessStatus, BoxFuture, CalendarDescriptor, CalendarProvider, ErrorProvider, FetchOptions,
    NewCalendar,
};
pub use record::ProviderEventRecord;
